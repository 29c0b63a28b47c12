#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pixsynth_api::config::ServerConfig;
use pixsynth_api::state::AppState;
use pixsynth_db::MemoryCharacterRepo;
use pixsynth_gateway::{
    DirectionTransformRequest, GatewayError, ImageGateway, ImageRequest, SequenceRequest,
    TextGateway,
};
use pixsynth_pipeline::{GenerationContext, GenerationService, PipelineConfig, Sleeper};
use pixsynth_storage::{LocalBlobStore, StorageConfig};
use tempfile::TempDir;
use tower::ServiceExt;

pub fn png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Image provider that either always succeeds or always rate-limits.
#[derive(Default)]
pub struct StubImages {
    pub rate_limited: AtomicBool,
}

impl StubImages {
    fn check(&self) -> Result<(), GatewayError> {
        if self.rate_limited.load(Ordering::SeqCst) {
            return Err(GatewayError::RateLimited {
                detail: "quota".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ImageGateway for StubImages {
    async fn generate_image(&self, _: &ImageRequest) -> Result<Vec<u8>, GatewayError> {
        self.check()?;
        Ok(png())
    }

    async fn transform_direction(
        &self,
        _: &DirectionTransformRequest,
    ) -> Result<Vec<u8>, GatewayError> {
        self.check()?;
        Ok(png())
    }

    async fn generate_sequence(
        &self,
        request: &SequenceRequest,
    ) -> Result<Vec<Vec<u8>>, GatewayError> {
        self.check()?;
        Ok((0..request.frame_count).map(|_| png()).collect())
    }
}

pub struct StubText;

#[async_trait]
impl TextGateway for StubText {
    async fn generate_text(&self, _: &str, _: u32, _: f32) -> Result<String, GatewayError> {
        Ok("A wandering ronin.".into())
    }
}

pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _: Duration) {}
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
    }
}

/// Application plus handles the tests poke at. Keep it alive for the
/// duration of the test; dropping it removes the storage directory.
pub struct TestApp {
    pub router: Router,
    pub images: Arc<StubImages>,
    pub storage_dir: TempDir,
}

/// Build the full application router with in-memory persistence, a
/// temporary blob directory and stub providers.
pub fn build_test_app() -> TestApp {
    let storage_dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        root: storage_dir.path().to_path_buf(),
        public_base_url: "/static".into(),
    };
    let images = Arc::new(StubImages::default());
    let ctx = GenerationContext {
        images: images.clone(),
        text: Arc::new(StubText),
        repo: Arc::new(MemoryCharacterRepo::new()),
        blobs: Arc::new(LocalBlobStore::new(storage.root.clone())),
        sleeper: Arc::new(NoSleep),
        config: PipelineConfig::default(),
    };
    let state = AppState {
        service: GenerationService::new(ctx),
        storage: Arc::new(storage),
        config: Arc::new(test_config()),
        pool: None,
    };
    TestApp {
        router: pixsynth_api::build_app(state),
        images,
        storage_dir,
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, json: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(json)).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}

/// Generate a four-direction character and return its id.
pub async fn create_character(app: &Router) -> String {
    let response = post_json(
        app,
        "/api/v1/characters/generate",
        serde_json::json!({ "name": "Ronin", "characterClass": "samurai", "imageCount": 4 }),
    )
    .await;
    assert_status(&response, StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}
