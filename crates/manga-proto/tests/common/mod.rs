//! Mock catalog for the client contract tests: junk list entries, a
//! non-array `/popular`, null chapter lists and captured request bodies.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Request counters and captured bodies from the mock catalog.
#[derive(Debug, Default)]
pub struct Hits {
    pub info: AtomicUsize,
    pub export: AtomicUsize,
    pub last_export_body: Mutex<Option<Value>>,
    pub last_info_title: Mutex<Option<String>>,
}

impl Hits {
    pub fn export_count(&self) -> usize {
        self.export.load(Ordering::SeqCst)
    }
}

/// How the mock answers `POST /chapters`.
#[derive(Debug, Clone, Copy)]
pub enum ExportMode {
    Pdf,
    Fail,
}

pub const PDF_BYTES: &[u8] = b"%PDF-1.4 mock export";

/// Serve a small in-memory catalog on an ephemeral loopback port.
/// Returns the base URL and the shared hit counters.
pub async fn spawn_catalog(export_mode: ExportMode) -> (String, Arc<Hits>) {
    let hits = Arc::new(Hits::default());

    let info_hits = hits.clone();
    let export_hits = hits.clone();

    let app = Router::new()
        .route(
            "/featured",
            get(|| async {
                Json(json!([
                    {"title": "Berserk", "image": "http://img/berserk.jpg", "description": "Dark fantasy"},
                    {"title": "Vagabond", "image": "http://img/vagabond.jpg", "description": "Samurai"},
                    "not an item",
                    {"title": "Monster"}
                ]))
            }),
        )
        .route(
            "/popular",
            get(|| async { Json(json!({"error": "popular list unavailable"})) }),
        )
        .route(
            "/info",
            get(move |Query(q): Query<std::collections::HashMap<String, String>>| {
                let hits = info_hits.clone();
                async move {
                    hits.info.fetch_add(1, Ordering::SeqCst);
                    let title = q.get("title").cloned().unwrap_or_default();
                    *hits.last_info_title.lock().unwrap() = Some(title.clone());
                    if title == "Demo" || title == "One Piece" {
                        Json(json!({"cover": "http://img/demo.jpg", "chapters": ["c1", "c2", "c3", "c4", "c5"]}))
                    } else {
                        Json(json!({"cover": "", "chapters": null}))
                    }
                }
            }),
        )
        .route(
            "/mangapage",
            get(|Query(q): Query<std::collections::HashMap<String, String>>| async move {
                let title = q.get("title").cloned().unwrap_or_default();
                Json(json!({
                    "image": "http://img/page.jpg",
                    "name": title,
                    "description": "A long story",
                    "chapters": ["Chapter 1", "Chapter 2"]
                }))
            }),
        )
        .route(
            "/chapterimages",
            post(|Json(body): Json<Value>| async move {
                let chapter = body.get("chapter").and_then(|c| c.as_str()).unwrap_or("");
                if chapter.is_empty() {
                    return (StatusCode::BAD_REQUEST, "missing chapter").into_response();
                }
                Json(json!({"images": [
                    format!("http://img/{}/1.jpg", chapter),
                    format!("http://img/{}/2.jpg", chapter)
                ]}))
                .into_response()
            }),
        )
        .route(
            "/chapters",
            post(move |Json(body): Json<Value>| {
                let hits = export_hits.clone();
                async move {
                    hits.export.fetch_add(1, Ordering::SeqCst);
                    *hits.last_export_body.lock().unwrap() = Some(body);
                    match export_mode {
                        ExportMode::Pdf => (
                            StatusCode::OK,
                            [(header::CONTENT_TYPE, "application/pdf")],
                            PDF_BYTES.to_vec(),
                        )
                            .into_response(),
                        ExportMode::Fail => {
                            (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response()
                        }
                    }
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}
