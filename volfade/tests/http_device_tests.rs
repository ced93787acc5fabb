//! HTTP volume device against a stub audio player on loopback

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use volfade::device::{HttpVolumeDevice, PlayerRef, VolumeDevice};
use volfade::fade::{run_fade, FadeRequest};
use volfade_common::FadeCurve;

#[derive(Debug, Default)]
struct StubPlayer {
    volume: u8,
    posts: Vec<u8>,
}

type Stub = Arc<Mutex<StubPlayer>>;

async fn get_volume(State(stub): State<Stub>) -> Json<Value> {
    Json(json!({ "volume": stub.lock().await.volume }))
}

async fn set_volume(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    let volume = body["volume"].as_u64().unwrap_or(0).min(100) as u8;
    let mut player = stub.lock().await;
    player.volume = volume;
    player.posts.push(volume);
    Json(json!({ "volume": volume }))
}

async fn spawn_stub(initial: u8) -> (String, Stub) {
    let stub: Stub = Arc::new(Mutex::new(StubPlayer {
        volume: initial,
        posts: Vec::new(),
    }));

    let app = Router::new()
        .route("/audio/volume", get(get_volume).post(set_volume))
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), stub)
}

fn device(base: &str) -> HttpVolumeDevice {
    HttpVolumeDevice::new("stub", base, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_read_scales_percent() {
    let (base, _stub) = spawn_stub(40).await;
    let volume = device(&base).read_volume().await.unwrap();
    assert_eq!(volume, Some(0.4));
}

#[tokio::test]
async fn test_write_sends_percent() {
    let (base, stub) = spawn_stub(0).await;
    device(&base).write_volume(0.736).await.unwrap();
    assert_eq!(stub.lock().await.posts, vec![74]);
}

#[tokio::test]
async fn test_fade_over_http() {
    let (base, stub) = spawn_stub(10).await;
    let device = device(&base);

    let outcome = run_fade(
        &PlayerRef::from("stub"),
        &device,
        &FadeRequest::new(0.6, 0.5, FadeCurve::Linear),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(!outcome.is_cancelled());
    assert_eq!(outcome.plan().total_steps, 5);

    let player = stub.lock().await;
    assert_eq!(player.posts, vec![20, 30, 40, 50, 60]);
    assert_eq!(player.volume, 60);
}
