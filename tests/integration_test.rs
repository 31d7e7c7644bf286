mod common;

use common::{png_bytes, standard_scene};
use greenscreen_compositor::compositing::Image;
use image::Rgb;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

// Use atomic counter to give each test a unique port
static PORT_COUNTER: AtomicU16 = AtomicU16::new(9500);

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DetectResponse {
    corners: Vec<[f32; 2]>,
    image: String,
    width: u32,
    height: u32,
    preview_scale: f32,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct StageTiming {
    name: String,
    time_ms: u64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PreviewResponse {
    image: String,
    processing_time_ms: u64,
    stages: Vec<StageTiming>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ErrorResponse {
    error: String,
    code: String,
}

struct TestServer {
    child: Child,
    port: u16,
}

impl TestServer {
    fn start() -> Self {
        let port = PORT_COUNTER.fetch_add(1, Ordering::SeqCst);

        let child = Command::new(env!("CARGO_BIN_EXE_greenscreen-compositor"))
            .args(["serve", "--host", "127.0.0.1", "--port", &port.to_string()])
            .spawn()
            .expect("Failed to start server");

        // Wait for server to accept connections
        let deadline = Instant::now() + Duration::from_secs(10);
        while TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(Instant::now() < deadline, "server did not start on port {}", port);
            std::thread::sleep(Duration::from_millis(50));
        }

        Self { child, port }
    }

    fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

fn png_part(image: &Image, file_name: &str) -> Part {
    Part::bytes(png_bytes(image))
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .unwrap()
}

fn red_screenshot() -> Image {
    Image::from_pixel(400, 300, Rgb([255, 0, 0]))
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let response: HealthResponse = client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(response.status, "ok");
}

#[tokio::test]
async fn test_detect_endpoint() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let form = Form::new().part("base", png_part(&standard_scene(), "base.png"));
    let response = client
        .post(format!("{}/api/detect", server.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let result: DetectResponse = response.json().await.expect("Failed to parse response");
    assert_eq!((result.width, result.height), (800, 600));
    assert_eq!(result.preview_scale, 1.0);
    assert!(!result.image.is_empty());

    let expected = [[100.0, 100.0], [700.0, 100.0], [700.0, 500.0], [100.0, 500.0]];
    for (got, want) in result.corners.iter().zip(expected.iter()) {
        assert!(
            (got[0] - want[0]).abs() <= 6.0 && (got[1] - want[1]).abs() <= 6.0,
            "corner {:?} too far from {:?}",
            got,
            want
        );
    }
}

#[tokio::test]
async fn test_detect_without_screen_is_unprocessable() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let plain = Image::from_pixel(200, 150, Rgb([120, 120, 120]));
    let form = Form::new().part("base", png_part(&plain, "plain.png"));
    let response = client
        .post(format!("{}/api/detect", server.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 422);
    let error: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(error.code, "NO_REGION_FOUND");
}

#[tokio::test]
async fn test_preview_endpoint() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let form = Form::new()
        .part("base", png_part(&standard_scene(), "base.png"))
        .part("screenshot", png_part(&red_screenshot(), "shot.png"))
        .text("corners", "[[100,100],[700,100],[700,500],[100,500]]")
        .text("brightness", "10")
        .text("contrast", "-5");

    let response = client
        .post(format!("{}/api/preview", server.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let result: PreviewResponse = response.json().await.expect("Failed to parse response");
    assert!(!result.image.is_empty());
    let names: Vec<&str> = result.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["warp", "lighting", "blend"]);
}

#[tokio::test]
async fn test_process_one_returns_png_download() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let form = Form::new()
        .part("base", png_part(&standard_scene(), "base.png"))
        .part("screenshot", png_part(&red_screenshot(), "écran home.png"))
        .text("corners", "100,100 700,100 700,500 100,500");

    let response = client
        .post(format!("{}/api/process-one", server.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"cran home_composite.png\"");

    let bytes = response.bytes().await.expect("Failed to read body");
    let image = image::load_from_memory(&bytes).expect("Response is not an image").into_rgb8();
    assert_eq!(image.dimensions(), (800, 600));
    let [r, g, _] = image.get_pixel(400, 300).0;
    assert!(r > 180 && g < 80);
}

#[tokio::test]
async fn test_invalid_corners_are_rejected() {
    let server = TestServer::start();
    let client = reqwest::Client::new();

    let form = Form::new()
        .part("base", png_part(&standard_scene(), "base.png"))
        .part("screenshot", png_part(&red_screenshot(), "shot.png"))
        .text("corners", "100,100 700,100 700,500");

    let response = client
        .post(format!("{}/api/process-one", server.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);
    let error: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(error.code, "INVALID_CORNER_INPUT");
}

#[test]
fn test_cli_detect_prints_corners() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.png");
    standard_scene().save(&base_path).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_greenscreen-compositor"))
        .args(["detect", "--base"])
        .arg(&base_path)
        .output()
        .expect("Failed to run detect");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["width"], 800);
    assert_eq!(json["height"], 600);
    assert_eq!(json["corners"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_bulk_composite_skips_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.png");
    standard_scene().save(&base_path).unwrap();

    let good = dir.path().join("good.png");
    red_screenshot().save(&good).unwrap();
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"definitely not a png").unwrap();

    let out_dir = dir.path().join("out");
    let status = Command::new(env!("CARGO_BIN_EXE_greenscreen-compositor"))
        .args(["composite", "--base"])
        .arg(&base_path)
        .arg("--screenshots")
        .arg(&good)
        .arg(&bad)
        .arg("--output-dir")
        .arg(&out_dir)
        .status()
        .expect("Failed to run composite");
    assert!(status.success());

    assert!(out_dir.join("good_composite.png").exists());
    assert!(!out_dir.join("bad_composite.png").exists());
}
