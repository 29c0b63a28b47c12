//! HTTP gateways to the external generation providers.
//!
//! The pipeline talks to [`ImageGateway`] and [`TextGateway`]; this crate
//! supplies the production implementations ([`PixelLabApi`], [`LlamaApi`]).

pub mod error;
pub mod llama;
pub mod pixellab;
pub mod types;

pub use error::GatewayError;
pub use llama::{LlamaApi, LlamaConfig};
pub use pixellab::{PixelLabApi, PixelLabConfig};
pub use types::{DirectionTransformRequest, ImageGateway, ImageRequest, SequenceRequest, TextGateway};
