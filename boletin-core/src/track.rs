// Tracking marker for the last processed edition, and the publisher's media
// listing it is compared against. The network side lives in the CLI.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Timestamp format of the media listing's `date` field
pub const MEDIA_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static EDITION_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}-\d{2}-\d{4}").expect("edition date pattern is valid"));

/// One item of the publisher's media listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub date: String,
    pub slug: String,
    pub source_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    #[serde(default, alias = "newsletterDate")]
    pub newsletter_date: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<String>,
}

impl TrackState {
    /// Missing file means nothing has been processed yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read track file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse track file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write track file: {}", path.display()))?;
        Ok(())
    }

    /// Whether `entry` is an edition this track has not processed yet.
    pub fn needs_processing(&self, entry: &MediaEntry) -> Result<bool> {
        match (&self.newsletter_date, &self.updated_at) {
            (Some(_), Some(updated_at)) => {
                let seen = parse_media_date(updated_at)?;
                let published = parse_media_date(&entry.date)?;
                Ok(seen != published)
            }
            _ => Ok(true),
        }
    }

    /// Track state after processing `entry`
    pub fn advanced_to(entry: &MediaEntry) -> Self {
        Self {
            newsletter_date: Some(extract_edition_date(&entry.slug)),
            updated_at: Some(entry.date.clone()),
        }
    }
}

pub fn parse_media_date(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, MEDIA_DATE_FORMAT)
        .with_context(|| format!("Invalid media timestamp: {text}"))
}

/// First listing entry whose slug names a newsletter
pub fn select_newsletter(entries: &[MediaEntry]) -> Option<&MediaEntry> {
    entries
        .iter()
        .find(|m| m.slug.to_lowercase().contains("boletin"))
}

/// `dd-mm-yyyy` from a slug, or empty when the slug carries no date
pub fn extract_edition_date(slug: &str) -> String {
    EDITION_DATE
        .find(slug)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
