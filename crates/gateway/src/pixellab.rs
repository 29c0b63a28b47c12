//! REST client for the PixelLab pixel-art generation API.
//!
//! Wraps three endpoints using [`reqwest`]:
//!
//! - `POST /generate-image-pixflux`: one image from a text description
//! - `POST /rotate`: re-render an image from another viewing direction
//! - `POST /animate-with-text`: animation frames from a reference image
//!
//! Rasters travel as base64 in both directions.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pixsynth_core::config::{env_duration_secs, env_string};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::{DirectionTransformRequest, ImageGateway, ImageRequest, SequenceRequest};

const PROVIDER: &str = "PixelLab";

/// Connection settings for PixelLab.
#[derive(Debug, Clone)]
pub struct PixelLabConfig {
    /// Bearer token. Calls fail with `NotConfigured` when absent.
    pub api_key: Option<String>,
    pub base_url: String,
    pub generate_timeout: Duration,
    pub rotate_timeout: Duration,
    pub animate_timeout: Duration,
}

impl Default for PixelLabConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.pixellab.ai/v1".into(),
            generate_timeout: Duration::from_secs(180),
            rotate_timeout: Duration::from_secs(120),
            animate_timeout: Duration::from_secs(120),
        }
    }
}

impl PixelLabConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                      |
    /// |----------------------------------|------------------------------|
    /// | `PIXELLAB_KEY`                   | unset                        |
    /// | `PIXELLAB_BASE_URL`              | `https://api.pixellab.ai/v1` |
    /// | `PIXELLAB_GENERATE_TIMEOUT_SECS` | `180`                        |
    /// | `PIXELLAB_ROTATE_TIMEOUT_SECS`   | `120`                        |
    /// | `PIXELLAB_ANIMATE_TIMEOUT_SECS`  | `120`                        |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("PIXELLAB_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env_string("PIXELLAB_BASE_URL", &defaults.base_url),
            generate_timeout: env_duration_secs(
                "PIXELLAB_GENERATE_TIMEOUT_SECS",
                defaults.generate_timeout,
            ),
            rotate_timeout: env_duration_secs("PIXELLAB_ROTATE_TIMEOUT_SECS", defaults.rotate_timeout),
            animate_timeout: env_duration_secs(
                "PIXELLAB_ANIMATE_TIMEOUT_SECS",
                defaults.animate_timeout,
            ),
        }
    }
}

/// HTTP client for PixelLab.
pub struct PixelLabApi {
    client: reqwest::Client,
    config: PixelLabConfig,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ImageSize {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct Base64Image {
    #[serde(rename = "type")]
    kind: &'static str,
    base64: String,
}

impl Base64Image {
    fn encode(bytes: &[u8]) -> Self {
        Self {
            kind: "base64",
            base64: BASE64.encode(bytes),
        }
    }
}

#[derive(Debug, Serialize)]
struct PixfluxBody<'a> {
    description: &'a str,
    image_size: ImageSize,
    detail: &'a str,
    direction: Option<&'static str>,
    no_background: bool,
}

#[derive(Debug, Serialize)]
struct RotateBody {
    from_image: Base64Image,
    from_direction: &'static str,
    to_direction: &'static str,
    from_view: &'static str,
    to_view: &'static str,
    image_guidance_scale: f32,
    image_size: ImageSize,
}

#[derive(Debug, Serialize)]
struct AnimateBody<'a> {
    reference_image: Base64Image,
    description: &'a str,
    action: &'static str,
    direction: &'static str,
    view: &'static str,
    n_frames: u32,
    image_guidance_scale: f32,
    init_image_strength: f32,
    image_size: ImageSize,
}

#[derive(Debug, Deserialize)]
struct EncodedImage {
    base64: String,
}

#[derive(Debug, Deserialize)]
struct SingleImageResponse {
    image: EncodedImage,
}

/// Animation frames arrive either as `{"base64": ..}` objects or bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FramePayload {
    Object(EncodedImage),
    Bare(String),
}

#[derive(Debug, Deserialize)]
struct SequenceResponse {
    images: Vec<FramePayload>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl PixelLabApi {
    pub fn new(config: PixelLabConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: PixelLabConfig) -> Self {
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<String, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured(PROVIDER))?;

        let url = format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(url = %url, "Sending PixelLab request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(
                endpoint,
                status = status.as_u16(),
                "PixelLab request failed",
            );
            return Err(GatewayError::from_status(status.as_u16(), truncate_body(text)));
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageGateway for PixelLabApi {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<u8>, GatewayError> {
        let body = PixfluxBody {
            description: &request.description,
            image_size: ImageSize {
                width: request.width,
                height: request.height,
            },
            detail: &request.detail,
            direction: request.direction.map(|d| d.as_str()),
            no_background: request.no_background,
        };
        let text = self
            .post_json("generate-image-pixflux", &body, self.config.generate_timeout)
            .await?;
        let bytes = decode_single_image(&text)?;
        tracing::info!(size = bytes.len(), "Generated pixel art image");
        Ok(bytes)
    }

    async fn transform_direction(
        &self,
        request: &DirectionTransformRequest,
    ) -> Result<Vec<u8>, GatewayError> {
        let body = RotateBody {
            from_image: Base64Image::encode(&request.source),
            from_direction: request.from.as_str(),
            to_direction: request.to.as_str(),
            from_view: "side",
            to_view: "side",
            image_guidance_scale: request.guidance_scale,
            image_size: ImageSize {
                width: request.width,
                height: request.height,
            },
        };
        let text = self
            .post_json("rotate", &body, self.config.rotate_timeout)
            .await?;
        decode_single_image(&text)
    }

    async fn generate_sequence(
        &self,
        request: &SequenceRequest,
    ) -> Result<Vec<Vec<u8>>, GatewayError> {
        let body = AnimateBody {
            reference_image: Base64Image::encode(&request.reference),
            description: &request.description,
            action: request.action.as_str(),
            direction: request.direction.as_str(),
            view: "side",
            n_frames: request.frame_count,
            image_guidance_scale: request.guidance_scale,
            init_image_strength: request.reference_influence,
            image_size: ImageSize {
                width: request.size,
                height: request.size,
            },
        };
        let text = self
            .post_json("animate-with-text", &body, self.config.animate_timeout)
            .await?;
        let frames = decode_sequence(&text)?;
        tracing::info!(
            action = %request.action,
            direction = %request.direction,
            frames = frames.len(),
            "Generated animation frames",
        );
        Ok(frames)
    }
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

fn decode_single_image(body: &str) -> Result<Vec<u8>, GatewayError> {
    let parsed: SingleImageResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("missing 'image.base64': {e}")))?;
    decode_base64(&parsed.image.base64)
}

fn decode_sequence(body: &str) -> Result<Vec<Vec<u8>>, GatewayError> {
    let parsed: SequenceResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("missing 'images': {e}")))?;
    if parsed.images.is_empty() {
        return Err(GatewayError::Malformed("no frames returned".into()));
    }
    parsed
        .images
        .iter()
        .map(|frame| match frame {
            FramePayload::Object(img) => decode_base64(&img.base64),
            FramePayload::Bare(s) => decode_base64(s),
        })
        .collect()
}

fn decode_base64(data: &str) -> Result<Vec<u8>, GatewayError> {
    // Some responses carry a data URL prefix.
    let data = data.split_once("base64,").map_or(data, |(_, rest)| rest);
    BASE64
        .decode(data.trim())
        .map_err(|e| GatewayError::Malformed(format!("invalid base64 payload: {e}")))
}

fn truncate_body(mut body: String) -> String {
    const MAX: usize = 500;
    if let Some((cut, _)) = body.char_indices().nth(MAX) {
        body.truncate(cut);
    }
    body
}
