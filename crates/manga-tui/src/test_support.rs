//! In-process mock catalog for tests.
//!
//! Serves one coherent title ("Demo", slug `demo`) through the whole
//! browse → detail → reader → export flow. Malformed payloads are covered
//! by the contract mock in `manga-proto/tests/common`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Default)]
pub struct Hits {
    pub info: AtomicUsize,
    pub export: AtomicUsize,
}

impl Hits {
    pub fn export_count(&self) -> usize {
        self.export.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ExportMode {
    Pdf,
    Fail,
}

pub const PDF_BYTES: &[u8] = b"%PDF-1.4 mock export";

pub async fn spawn_catalog(export_mode: ExportMode) -> (String, Arc<Hits>) {
    let hits = Arc::new(Hits::default());
    let info_hits = hits.clone();
    let export_hits = hits.clone();

    let app = Router::new()
        .route(
            "/featured",
            get(|| async {
                Json(json!([
                    {"title": "Demo", "image": "http://img/demo.jpg", "description": "A demo title"},
                    {"title": "Vagabond", "image": "http://img/vagabond.jpg", "description": "Samurai"},
                    {"title": "Monster", "image": "http://img/monster.jpg", "description": "Thriller"}
                ]))
            }),
        )
        .route(
            "/popular",
            get(|| async {
                Json(json!([
                    {"image": "http://img/demo.jpg", "name": "Demo", "chapters": ["c5", "c4"]},
                    {"image": "http://img/berserk.jpg", "name": "Berserk", "chapters": ["374"]},
                    {"image": "", "name": "Monster", "chapters": null}
                ]))
            }),
        )
        .route(
            "/mangapage",
            get(|Query(q): Query<std::collections::HashMap<String, String>>| async move {
                match q.get("title").map(String::as_str) {
                    Some("demo") => Json(json!({
                        "image": "http://img/demo.jpg",
                        "name": "Demo",
                        "description": "A demo title",
                        "chapters": ["c5", "c4", "c3", "c2", "c1"]
                    }))
                    .into_response(),
                    _ => StatusCode::NOT_FOUND.into_response(),
                }
            }),
        )
        .route(
            "/chapterimages",
            post(|Json(body): Json<Value>| async move {
                if body["manga"] != "demo" {
                    return StatusCode::NOT_FOUND.into_response();
                }
                let chapter = body["chapter"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "images": [
                        format!("http://img/demo/{}/1.jpg", chapter),
                        format!("http://img/demo/{}/2.jpg", chapter)
                    ]
                }))
                .into_response()
            }),
        )
        .route(
            "/info",
            get(move |Query(q): Query<std::collections::HashMap<String, String>>| {
                let hits = info_hits.clone();
                async move {
                    hits.info.fetch_add(1, Ordering::SeqCst);
                    match q.get("title").map(String::as_str) {
                        Some("Demo") => Json(json!({
                            "cover": "http://img/demo.jpg",
                            "chapters": ["c1", "c2", "c3", "c4", "c5"]
                        })),
                        _ => Json(json!({"cover": "", "chapters": null})),
                    }
                }
            }),
        )
        .route(
            "/chapters",
            post(move |Json(_body): Json<Value>| {
                let hits = export_hits.clone();
                async move {
                    hits.export.fetch_add(1, Ordering::SeqCst);
                    match export_mode {
                        ExportMode::Pdf => (
                            StatusCode::OK,
                            [(header::CONTENT_TYPE, "application/pdf")],
                            PDF_BYTES.to_vec(),
                        )
                            .into_response(),
                        ExportMode::Fail => {
                            (StatusCode::BAD_GATEWAY, "upstream failed").into_response()
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
