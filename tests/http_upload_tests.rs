use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};

use flower_classifier::handlers::{router, AppState};
use flower_classifier::{ClassLabelTable, Config, InferencePipeline, StubClassifier};

fn red_pixel_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 0, 0])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

async fn spawn_app(root: &Path, config: Config) -> String {
    let cfg = Config {
        upload_folder: root.join("uploads"),
        processed_folder: root.join("processed"),
        ..config
    };
    let labels = ClassLabelTable::flowers();
    let classifier = Arc::new(StubClassifier::peaked(labels.len(), 2));
    let pipeline = Arc::new(InferencePipeline::new(cfg, classifier, labels).unwrap());
    let app = router(AppState::new(pipeline).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}

fn dir_len(path: &Path) -> usize {
    std::fs::read_dir(path).unwrap().count()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;

    let res = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(res.status().as_u16(), StatusCode::OK.as_u16());
    let body = res.text().await.unwrap();
    assert!(body.contains(r#"enctype="multipart/form-data""#));
    assert!(!body.contains("flower-name"));
}

#[tokio::test]
async fn test_post_without_file_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;
    let client = reqwest::Client::new();

    // Multipart body with only an unrelated text field
    let form = Form::new().text("comment", "no image here");
    let res = client.post(format!("{}/", base)).multipart(form).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(res.text().await.unwrap(), "No file selected");

    // A `file` field that is a plain value rather than a file
    let form = Form::new().text("file", "just text");
    let res = client.post(format!("{}/", base)).multipart(form).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(res.text().await.unwrap(), "No file selected");

    // Not multipart at all
    let res = client.post(format!("{}/", base)).body("").send().await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(res.text().await.unwrap(), "No file selected");

    assert_eq!(dir_len(&tmp.path().join("uploads")), 0);
    assert_eq!(dir_len(&tmp.path().join("processed")), 0);
}

#[tokio::test]
async fn test_empty_file_part_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;

    let part = Part::bytes(Vec::new()).file_name("empty.png").mime_str("image/png").unwrap();
    let res = reqwest::Client::new()
        .post(format!("{}/", base))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(res.text().await.unwrap(), "No file selected");
    assert_eq!(dir_len(&tmp.path().join("uploads")), 0);
}

#[tokio::test]
async fn test_upload_over_size_limit_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config { max_image_size_mb: 1, ..Config::default() }).await;

    let part = Part::bytes(vec![0u8; 2 * 1024 * 1024]).file_name("huge.png");
    let res = reqwest::Client::new()
        .post(format!("{}/", base))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 413);
    assert_eq!(dir_len(&tmp.path().join("uploads")), 0);
    assert_eq!(dir_len(&tmp.path().join("processed")), 0);
}

#[tokio::test]
async fn test_post_image_renders_prediction() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;
    let client = reqwest::Client::new();

    let part = Part::bytes(red_pixel_png()).file_name("red.png").mime_str("image/png").unwrap();
    let res = client
        .post(format!("{}/", base))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = res.text().await.unwrap();
    // Stub peaks at index 2
    assert!(body.contains("Agapanthus"), "body: {body}");
    assert!(body.contains("red.png"));

    assert!(tmp.path().join("uploads/red.png").is_file());
    assert!(tmp.path().join("processed/red.png").is_file());

    // The processed copy is served from the static prefix
    let res = reqwest::get(format!("{}/static/processed/red.png", base)).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.bytes().await.unwrap();
    let served = image::load_from_memory(&bytes).unwrap();
    assert_eq!((served.width(), served.height()), (224, 224));

    let res = reqwest::get(format!("{}/static/uploads/red.png", base)).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.bytes().await.unwrap().to_vec(), red_pixel_png());
}

#[tokio::test]
async fn test_same_filename_twice_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let part = Part::bytes(red_pixel_png()).file_name("dup.png");
        let res = client
            .post(format!("{}/", base))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
    }
    assert_eq!(dir_len(&tmp.path().join("uploads")), 1);
}

#[tokio::test]
async fn test_corrupt_image_is_unprocessable() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;

    let part = Part::bytes(b"GIF89a truncated".to_vec()).file_name("bad.gif");
    let res = reqwest::Client::new()
        .post(format!("{}/", base))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 422);
    assert!(res.text().await.unwrap().starts_with("Decode error"));
    assert_eq!(dir_len(&tmp.path().join("processed")), 0);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_app(tmp.path(), Config::default()).await;

    let res = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "OK");

    let res = reqwest::get(format!("{}/metrics", base)).await.unwrap();
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json["requests"]["predictions_ok"].is_u64());
    assert!(json["inference_latency_ms"]["counts"].is_array());
}
