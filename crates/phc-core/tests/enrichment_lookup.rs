use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use phc_core::enrich::{EnrichError, ItunesClient};
use phc_core::metadata::DEFAULT_ALBUM_ART;
use phc_core::pipeline::MetadataPipeline;
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn search(State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let term = q.get("term").cloned().unwrap_or_default();
    seen.lock().unwrap().push(q);
    if term.contains("Nobody") {
        return Json(json!({ "resultCount": 0, "results": [] }));
    }
    Json(json!({
        "resultCount": 1,
        "results": [{
            "artworkUrl100": "https://is1.example/img/100x100bb.jpg",
            "releaseDate": "1977-10-14T08:00:00Z",
            "primaryGenreName": "Funk",
            "collectionName": "Live Album"
        }]
    }))
}

async fn start_mock() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/search", get(search))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn lookup_sends_cleaned_term_and_extracts_fields() {
    let (base, seen) = start_mock().await;
    let client = ItunesClient::new(format!("{base}/search"), Duration::from_secs(5)).unwrap();

    let found = client
        .lookup("Band - Tune (2011 Remaster) [Live]")
        .await
        .unwrap()
        .expect("mock returns one result");

    assert_eq!(
        found.artwork_url.as_deref(),
        Some("https://is1.example/img/600x600bb.jpg")
    );
    assert_eq!(found.genre.as_deref(), Some("Funk"));
    assert_eq!(found.release_year, Some(1977));
    assert_eq!(found.album_name.as_deref(), Some("Live Album"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["term"], "Band - Tune");
    assert_eq!(seen[0]["entity"], "song");
    assert_eq!(seen[0]["limit"], "1");
}

#[tokio::test]
async fn lookup_without_results_is_none() {
    let (base, _) = start_mock().await;
    let client = ItunesClient::new(format!("{base}/search"), Duration::from_secs(5)).unwrap();
    assert!(client.lookup("Nobody - Nothing").await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_reports_http_status() {
    let (base, _) = start_mock().await;
    let client = ItunesClient::new(format!("{base}/broken"), Duration::from_secs(5)).unwrap();
    let err = client.lookup("x").await.unwrap_err();
    assert!(matches!(err, EnrichError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn lookup_result_writes_back_through_pipeline() {
    let (base, _) = start_mock().await;
    let client = ItunesClient::new(format!("{base}/search"), Duration::from_secs(5)).unwrap();
    let mut pipeline = MetadataPipeline::new(Default::default(), 20);

    let req = pipeline
        .handle_message(r#"{"streamTitle":"Band - Tune"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(pipeline.now_playing().album_art_url, DEFAULT_ALBUM_ART);

    let found = client.lookup(&req.search_term).await.unwrap().unwrap();
    let wb = pipeline.apply_enrichment(&req, &found);

    assert!(wb.now_playing_art);
    assert_eq!(
        pipeline.now_playing().album_art_url,
        "https://is1.example/img/600x600bb.jpg"
    );
    let head = pipeline.history().head().unwrap();
    assert_eq!(head.album_name.as_deref(), Some("Live Album"));
    assert_eq!(head.release_year, Some(1977));
}
