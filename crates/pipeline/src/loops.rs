//! Loop (GIF) encoding and storage for frame sequences.

use pixsynth_core::loop_encoder::{encode_loop, EncodedLoop, SequencedFrame};
use pixsynth_core::types::BlobPointer;

use crate::context::GenerationContext;
use crate::error::PipelineError;

/// Encode `frames` off the async runtime and store the result at
/// `logical_path`.
pub async fn encode_and_store(
    ctx: &GenerationContext,
    frames: Vec<SequencedFrame>,
    frame_duration_ms: u32,
    loop_count: u16,
    logical_path: &str,
) -> Result<(BlobPointer, EncodedLoop), PipelineError> {
    let encoded = tokio::task::spawn_blocking(move || {
        encode_loop(frames, frame_duration_ms, loop_count)
    })
    .await
    .map_err(|e| PipelineError::Generation(format!("Loop encoding task failed: {e}")))??;

    let pointer = ctx.blobs.put(&encoded.bytes, logical_path).await?;
    tracing::info!(
        path = logical_path,
        frames = encoded.frame_count,
        size = encoded.bytes.len(),
        "Stored loop artifact",
    );
    Ok((pointer, encoded))
}
