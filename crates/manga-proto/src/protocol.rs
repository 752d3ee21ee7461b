//! Wire types for the catalog service.
//!
//! Every response is decoded defensively: a collection that is missing,
//! `null`, or not an array decodes as empty instead of failing the whole
//! payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A featured title shown in the carousel (`GET /featured`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeaturedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

/// A card in the popular strip (`GET /popular`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopularManga {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub chapters: Vec<String>,
}

/// Title metadata used by the download wizard (`GET /info?title=`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TitleInfo {
    #[serde(default)]
    pub cover: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub chapters: Vec<String>,
}

/// Detail screen payload (`GET /mangapage?title=`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MangaPage {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub chapters: Vec<String>,
}

/// Body of `POST /chapterimages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterImagesRequest {
    pub manga: String,
    pub chapter: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterImages {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub images: Vec<String>,
}

/// Body of `POST /chapters`: export a contiguous chapter range as one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub title: String,
    pub chapters: Vec<String>,
}

impl ExportRequest {
    /// `<title>_<first>-<last>.<ext>`, or `None` for an empty range.
    pub fn file_name(&self, ext: &str) -> Option<String> {
        let first = self.chapters.first()?;
        let last = self.chapters.last()?;
        Some(format!(
            "{}_{}-{}.{}",
            path_safe(&self.title),
            path_safe(first),
            path_safe(last),
            ext
        ))
    }
}

/// Keep a name component inside a single path segment.
fn path_safe(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Route slug for a title: lowercase, whitespace runs collapsed to `-`.
pub fn title_slug(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// File extension for an exported document, from its `Content-Type`.
pub fn export_extension(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase());
    match mime.as_deref() {
        Some("application/epub+zip") => "epub",
        Some("application/zip") | Some("application/x-cbz") | Some("application/vnd.comicbook+zip") => "cbz",
        _ => "pdf",
    }
}

/// Decode a top-level JSON list. Anything but an array yields an empty list;
/// elements that don't fit `T` are skipped.
pub fn decode_list<T: DeserializeOwned>(value: serde_json::Value) -> Vec<T> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
