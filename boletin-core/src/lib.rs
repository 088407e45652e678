// Boletin Core Library
//
// Rebuilds the tables of an investment newsletter from the raw grids a PDF
// table extractor produces: classification into nine categories, structural
// repair and normalization.

pub mod types;
pub mod error;
pub mod text;
pub mod table;
pub mod repair;
pub mod config;
pub mod classifier;
pub mod cleaners;
pub mod pipeline;
pub mod cache;
pub mod storage;
pub mod processor;
pub mod track;

// Re-export main types and functions for easy use
pub use types::*;
pub use classifier::{Bucket, Buckets, TableClassifier};
pub use config::EngineConfig;
pub use error::{CleanError, CleanResult};
pub use pipeline::DocumentPipeline;
pub use processor::{load_tables_from_file, DocumentProcessor, PipelineStages};
pub use text::normalize;
pub use track::{MediaEntry, TrackState};
