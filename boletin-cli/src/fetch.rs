//! Newsletter fetcher - publisher media listing and PDF download
//!
//! Lists the publisher's media library, picks the latest newsletter and
//! downloads its PDF. The tracking marker lives in the user's data directory
//! so repeated checks against the same edition do nothing.

use anyhow::{anyhow, Context, Result};
use boletin_core::storage::calculate_pdf_hash;
use boletin_core::MediaEntry;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Publisher site whose media library carries the newsletter
pub const DEFAULT_BASE_URL: &str = "https://www.cadiem.com.py";

/// Media type of PDF uploads in the listing
const MEDIA_TYPE: &str = "application";

pub struct NewsletterFetcher {
    base_url: String,
    /// Base directory for boletin data (e.g., ~/.local/share/boletin)
    data_dir: PathBuf,
}

impl NewsletterFetcher {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        Ok(Self::with_data_dir(base_url, data_dir))
    }

    pub fn with_data_dir(base_url: Option<&str>, data_dir: PathBuf) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            data_dir,
        }
    }

    /// Platform data directory (`~/.local/share/boletin` on Linux)
    fn default_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|d| d.join("boletin"))
            .ok_or_else(|| anyhow!("Could not determine the user data directory"))
    }

    /// Default location of the tracking marker
    pub fn track_path(&self) -> PathBuf {
        self.data_dir.join("track.json")
    }

    pub fn media_url(&self) -> String {
        format!("{}/wp-json/wp/v2/media", self.base_url)
    }

    /// Fetch the media listing, newest first
    pub fn list_media(&self) -> Result<Vec<MediaEntry>> {
        let url = self.media_url();
        let body = ureq::get(&url)
            .query("media_type", MEDIA_TYPE)
            .call()
            .with_context(|| format!("Failed to fetch media listing from {}", url))?
            .into_string()
            .context("Failed to read media listing body")?;

        let entries: Vec<MediaEntry> =
            serde_json::from_str(&body).context("Unexpected media listing format")?;
        debug!("media listing returned {} entries", entries.len());
        Ok(entries)
    }

    /// Download the entry's PDF into `dest_dir`. Returns the saved path.
    /// Nothing is written unless the body is a PDF.
    pub fn download_pdf(&self, entry: &MediaEntry, dest_dir: &Path) -> Result<PathBuf> {
        println!("📥 Downloading {}", entry.source_url);
        let bytes = fetch_pdf(&entry.source_url)?;

        fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;
        let dest = dest_dir.join(pdf_file_name(&entry.slug));
        fs::write(&dest, &bytes)
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        println!(
            "   sha256 {} ({:.1} KB)",
            &calculate_pdf_hash(&bytes)[..12],
            bytes.len() as f64 / 1_000.0
        );
        Ok(dest)
    }
}

/// Newsletters are a few MB; anything past this is not an edition
const MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

fn fetch_pdf(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Failed to download from {}", url))?;
    debug!("content-type: {}", response.content_type());

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_PDF_BYTES + 1)
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read body of {}", url))?;
    check_pdf(&bytes)?;
    Ok(bytes)
}

/// Reject bodies that are too large or are not a PDF (e.g. an HTML error page).
pub fn check_pdf(bytes: &[u8]) -> Result<()> {
    if bytes.len() as u64 > MAX_PDF_BYTES {
        return Err(anyhow!("Download exceeds {} MB", MAX_PDF_BYTES / (1024 * 1024)));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(anyhow!("Downloaded file is not a PDF"));
    }
    Ok(())
}

/// File name for a downloaded edition
pub fn pdf_file_name(slug: &str) -> String {
    let stem: String = slug
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "boletin".to_string() } else { stem };
    format!("{stem}.pdf")
}
