//! Export manager for chapter ranges
//!
//! Sends export requests to the catalog in the background and writes the
//! returned document into the downloads directory. A failed request writes
//! nothing and is not retried.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use manga_proto::catalog::CatalogClient;
use manga_proto::protocol::ExportRequest;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Export status for one chapter range
#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Idle,
    /// Receiving the document (0.0 - 1.0, stays at 0.0 without a length)
    Exporting(f32),
    Saved { path: PathBuf, at: DateTime<Local> },
    Failed(String),
}

/// Progress update from an export task
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub key: String,
    pub status: ExportStatus,
}

pub struct ExportManager {
    /// Status per range key (`<title>_<first>-<last>`)
    pub statuses: HashMap<String, ExportStatus>,
    pub download_dir: PathBuf,
    /// Keys still exporting, oldest first.
    in_flight: Vec<String>,
    client: CatalogClient,
    progress_tx: mpsc::Sender<ExportProgress>,
    progress_rx: mpsc::Receiver<ExportProgress>,
}

impl ExportManager {
    pub fn new(client: CatalogClient, download_dir: PathBuf) -> Self {
        let (progress_tx, progress_rx) = mpsc::channel(100);
        Self {
            statuses: HashMap::new(),
            download_dir,
            in_flight: Vec::new(),
            client,
            progress_tx,
            progress_rx,
        }
    }

    /// Identifies a range independent of the document format.
    pub fn key(request: &ExportRequest) -> String {
        format!(
            "{}_{}-{}",
            request.title,
            request.chapters.first().map(String::as_str).unwrap_or(""),
            request.chapters.last().map(String::as_str).unwrap_or("")
        )
    }

    /// Start exporting a range. Returns the range key.
    pub fn start_export(&mut self, request: ExportRequest) -> Result<String, String> {
        if request.chapters.is_empty() {
            return Err("Empty chapter range".to_string());
        }
        let key = Self::key(&request);
        if let Some(ExportStatus::Exporting(_)) = self.statuses.get(&key) {
            return Err("Already exporting".to_string());
        }

        info!("Starting export of {}", key);
        self.statuses
            .insert(key.clone(), ExportStatus::Exporting(0.0));
        self.in_flight.push(key.clone());

        let client = self.client.clone();
        let download_dir = self.download_dir.clone();
        let progress_tx = self.progress_tx.clone();
        let task_key = key.clone();

        tokio::spawn(async move {
            let result =
                Self::do_export(&client, &request, &download_dir, &task_key, &progress_tx).await;

            let status = match result {
                Ok(path) => {
                    info!("Export complete: {:?}", path);
                    ExportStatus::Saved {
                        path,
                        at: Local::now(),
                    }
                }
                Err(e) => {
                    error!("Export failed: {:#}", e);
                    ExportStatus::Failed(format!("{:#}", e))
                }
            };

            let _ = progress_tx
                .send(ExportProgress {
                    key: task_key,
                    status,
                })
                .await;
        });

        Ok(key)
    }

    async fn do_export(
        client: &CatalogClient,
        request: &ExportRequest,
        download_dir: &Path,
        key: &str,
        progress_tx: &mpsc::Sender<ExportProgress>,
    ) -> anyhow::Result<PathBuf> {
        let mut last_percent = 0u32;
        let payload = client
            .export(request, |received, total| {
                let Some(total) = total.filter(|t| *t > 0) else {
                    return;
                };
                let fraction = (received as f32 / total as f32).min(1.0);
                let percent = (fraction * 100.0) as u32;
                if percent > last_percent {
                    last_percent = percent;
                    // Dropped updates are fine; the final status always arrives.
                    let _ = progress_tx.try_send(ExportProgress {
                        key: key.to_string(),
                        status: ExportStatus::Exporting(fraction),
                    });
                }
            })
            .await?;

        let file_name = request
            .file_name(payload.extension)
            .context("export request has no chapters")?;

        tokio::fs::create_dir_all(download_dir)
            .await
            .with_context(|| format!("Failed to create {}", download_dir.display()))?;
        let path = download_dir.join(file_name);
        tokio::fs::write(&path, &payload.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Apply pending progress updates. Returns the ones that finished
    /// (saved or failed) so the caller can report them.
    pub fn update_statuses(&mut self) -> Vec<ExportProgress> {
        let mut finished = Vec::new();
        while let Ok(progress) = self.progress_rx.try_recv() {
            // A late progress update must not overwrite a final status.
            if let ExportStatus::Exporting(_) = progress.status {
                if !matches!(self.statuses.get(&progress.key), Some(ExportStatus::Exporting(_))) {
                    continue;
                }
            } else {
                self.in_flight.retain(|k| *k != progress.key);
                finished.push(progress.clone());
            }
            self.statuses.insert(progress.key, progress.status);
        }
        finished
    }

    pub fn get_status(&self, key: &str) -> ExportStatus {
        self.statuses
            .get(key)
            .cloned()
            .unwrap_or(ExportStatus::Idle)
    }

    /// The most recently started export still in flight, if any.
    pub fn active(&self) -> Option<(&str, f32)> {
        self.in_flight.iter().rev().find_map(|k| match self.statuses.get(k) {
            Some(ExportStatus::Exporting(p)) => Some((k.as_str(), *p)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_catalog, ExportMode, PDF_BYTES};
    use std::time::Duration;
    use tempfile::TempDir;

    fn demo_request() -> ExportRequest {
        ExportRequest {
            title: "Demo".to_string(),
            chapters: vec!["c2".into(), "c3".into(), "c4".into()],
        }
    }

    async fn wait_finished(manager: &mut ExportManager) -> Vec<ExportProgress> {
        for _ in 0..200 {
            let finished = manager.update_statuses();
            if !finished.is_empty() {
                return finished;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("export did not finish");
    }

    #[tokio::test]
    async fn test_export_writes_document() {
        let (base, hits) = spawn_catalog(ExportMode::Pdf).await;
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("exports");
        let mut manager = ExportManager::new(CatalogClient::new(base), out.clone());

        let key = manager.start_export(demo_request()).unwrap();
        assert_eq!(key, "Demo_c2-c4");
        assert!(matches!(manager.get_status(&key), ExportStatus::Exporting(_)));

        let finished = wait_finished(&mut manager).await;
        assert_eq!(finished.len(), 1);
        let ExportStatus::Saved { path, .. } = manager.get_status(&key) else {
            panic!("expected saved status, got {:?}", manager.get_status(&key));
        };
        assert_eq!(path, out.join("Demo_c2-c4.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), PDF_BYTES);
        assert_eq!(hits.export_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_export_writes_nothing() {
        let (base, hits) = spawn_catalog(ExportMode::Fail).await;
        let dir = TempDir::new().unwrap();
        let mut manager = ExportManager::new(CatalogClient::new(base), dir.path().to_path_buf());

        let key = manager.start_export(demo_request()).unwrap();
        wait_finished(&mut manager).await;

        let ExportStatus::Failed(msg) = manager.get_status(&key) else {
            panic!("expected failure");
        };
        assert!(msg.contains("502"), "{}", msg);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(hits.export_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_empty_requests_refused() {
        let mut manager = ExportManager::new(
            CatalogClient::new("http://127.0.0.1:9"),
            std::env::temp_dir(),
        );
        manager
            .statuses
            .insert("Demo_c2-c4".to_string(), ExportStatus::Exporting(0.3));
        assert_eq!(
            manager.start_export(demo_request()),
            Err("Already exporting".to_string())
        );
        let empty = ExportRequest {
            title: "Demo".into(),
            chapters: vec![],
        };
        assert!(manager.start_export(empty).is_err());
        assert_eq!(manager.active(), None);
    }

    #[tokio::test]
    async fn test_active_is_latest_in_flight() {
        let mut manager = ExportManager::new(
            CatalogClient::new("http://127.0.0.1:9"),
            std::env::temp_dir(),
        );
        for (key, progress) in [("Demo_c1-c2", 0.5), ("Berserk_b1-b3", 0.1), ("Monster_m1-m1", 0.2)] {
            manager
                .statuses
                .insert(key.to_string(), ExportStatus::Exporting(progress));
            manager.in_flight.push(key.to_string());
        }
        assert_eq!(manager.active(), Some(("Monster_m1-m1", 0.2)));

        manager
            .progress_tx
            .try_send(ExportProgress {
                key: "Monster_m1-m1".into(),
                status: ExportStatus::Failed("502".into()),
            })
            .unwrap();
        assert_eq!(manager.update_statuses().len(), 1);
        assert_eq!(manager.active(), Some(("Berserk_b1-b3", 0.1)));
    }
}
