//! Catalog service client.
//!
//! One method per endpoint. Nothing here retries: every failure is returned
//! to the caller, which decides whether it degrades a view or is reported.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::protocol::{
    decode_list, export_extension, ChapterImages, ChapterImagesRequest, ExportRequest,
    FeaturedItem, MangaPage, PopularManga, TitleInfo,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned status {status}")]
    Status {
        path: &'static str,
        status: StatusCode,
    },
    #[error("failed to decode {path} response: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// An exported document, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn featured(&self) -> Result<Vec<FeaturedItem>, CatalogError> {
        let value: serde_json::Value = self.get_json("/featured", &[]).await?;
        let items = decode_list(value);
        debug!("featured: {} items", items.len());
        Ok(items)
    }

    pub async fn popular(&self) -> Result<Vec<PopularManga>, CatalogError> {
        let value: serde_json::Value = self.get_json("/popular", &[]).await?;
        let items = decode_list(value);
        debug!("popular: {} items", items.len());
        Ok(items)
    }

    pub async fn info(&self, title: &str) -> Result<TitleInfo, CatalogError> {
        self.get_json("/info", &[("title", title)]).await
    }

    pub async fn manga_page(&self, title: &str) -> Result<MangaPage, CatalogError> {
        self.get_json("/mangapage", &[("title", title)]).await
    }

    pub async fn chapter_images(
        &self,
        manga: &str,
        chapter: &str,
    ) -> Result<ChapterImages, CatalogError> {
        const PATH: &str = "/chapterimages";
        let body = ChapterImagesRequest {
            manga: manga.to_string(),
            chapter: chapter.to_string(),
        };
        let response = self
            .http
            .post(self.url(PATH))
            .json(&body)
            .send()
            .await
            .map_err(|source| CatalogError::Transport { path: PATH, source })?;
        let response = check_status(PATH, response)?;
        response
            .json()
            .await
            .map_err(|source| CatalogError::Decode { path: PATH, source })
    }

    /// Request a chapter range as one document.
    ///
    /// `on_progress(received, total)` is called after each body chunk; `total`
    /// is `None` when the server sends no `Content-Length`. A non-success
    /// status fails before any of the body is read.
    pub async fn export<F>(
        &self,
        request: &ExportRequest,
        mut on_progress: F,
    ) -> Result<ExportPayload, CatalogError>
    where
        F: FnMut(u64, Option<u64>),
    {
        const PATH: &str = "/chapters";
        info!(
            "export: {} ({} chapters)",
            request.title,
            request.chapters.len()
        );
        let response = self
            .http
            .post(self.url(PATH))
            .json(request)
            .send()
            .await
            .map_err(|source| CatalogError::Transport { path: PATH, source })?;
        let response = check_status(PATH, response)?;

        let extension = export_extension(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let total = response.content_length();

        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| CatalogError::Transport { path: PATH, source })?;
            bytes.extend_from_slice(&chunk);
            on_progress(bytes.len() as u64, total);
        }

        Ok(ExportPayload { bytes, extension })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| CatalogError::Transport { path, source })?;
        let response = check_status(path, response)?;
        response
            .json()
            .await
            .map_err(|source| CatalogError::Decode { path, source })
    }
}

fn check_status(
    path: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CatalogError::Status { path, status })
    }
}
