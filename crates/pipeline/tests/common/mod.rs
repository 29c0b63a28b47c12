//! Fakes shared by the pipeline integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pixsynth_core::character::{Character, CharacterStatus};
use pixsynth_core::direction::Direction;
use pixsynth_core::error::CoreError;
use pixsynth_core::form::CharacterForm;
use pixsynth_core::ports::{BlobStore, CharacterRepository};
use pixsynth_core::types::{BlobPointer, CharacterId};
use pixsynth_db::MemoryCharacterRepo;
use pixsynth_gateway::{
    DirectionTransformRequest, GatewayError, ImageGateway, ImageRequest, SequenceRequest,
    TextGateway,
};
use pixsynth_pipeline::{GenerationContext, GenerationService, PipelineConfig, Sleeper};
use pixsynth_storage::memory::MemoryBlobStore;

/// Solid-colour PNG, distinct per `shade`.
pub fn png(shade: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([shade, 255 - shade, 64, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Image gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Image(ImageRequest),
    Transform(DirectionTransformRequest),
    Sequence(SequenceRequest),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Image,
    Transform(Direction),
    Sequence,
}

#[derive(Debug, Clone, Copy)]
pub enum FailWith {
    Timeout,
    RateLimited,
    Server,
}

impl FailWith {
    fn error(self) -> GatewayError {
        match self {
            Self::Timeout => GatewayError::Timeout("scripted".into()),
            Self::RateLimited => GatewayError::RateLimited {
                detail: "slow down".into(),
            },
            Self::Server => GatewayError::Api {
                status: 500,
                body: "scripted".into(),
            },
        }
    }
}

/// Gateway calls and repository saves in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Gateway(Call),
    Save {
        has_reference: bool,
        images: usize,
    },
}

#[derive(Default)]
pub struct Journal {
    events: Mutex<Vec<Event>>,
}

impl Journal {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

struct Script {
    target: Target,
    remaining: u32,
    fail_with: FailWith,
}

/// Records every call and answers with small PNGs unless a scripted
/// failure matches.
#[derive(Default)]
pub struct FakeImages {
    calls: Mutex<Vec<Call>>,
    scripts: Mutex<Vec<Script>>,
    /// Frames returned per sequence call; `None` returns the requested count.
    pub sequence_len: Mutex<Option<usize>>,
    pub journal: Arc<Journal>,
}

impl FakeImages {
    /// Fail the next `times` calls to `target`.
    pub fn fail(&self, target: Target, times: u32, fail_with: FailWith) {
        self.scripts.lock().unwrap().push(Script {
            target,
            remaining: times,
            fail_with,
        });
    }

    pub fn fail_always(&self, target: Target, fail_with: FailWith) {
        self.fail(target, u32::MAX, fail_with);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Image(r) => Some(r.description),
                Call::Sequence(r) => Some(r.description),
                Call::Transform(_) => None,
            })
            .collect()
    }

    fn record(&self, call: Call, target: Target) -> Result<(), GatewayError> {
        self.journal.push(Event::Gateway(call.clone()));
        self.calls.lock().unwrap().push(call);
        let mut scripts = self.scripts.lock().unwrap();
        if let Some(script) = scripts
            .iter_mut()
            .find(|s| s.target == target && s.remaining > 0)
        {
            script.remaining = script.remaining.saturating_sub(1);
            return Err(script.fail_with.error());
        }
        Ok(())
    }
}

#[async_trait]
impl ImageGateway for FakeImages {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<u8>, GatewayError> {
        self.record(Call::Image(request.clone()), Target::Image)?;
        Ok(png(10))
    }

    async fn transform_direction(
        &self,
        request: &DirectionTransformRequest,
    ) -> Result<Vec<u8>, GatewayError> {
        self.record(Call::Transform(request.clone()), Target::Transform(request.to))?;
        Ok(png(request.to.clockwise_position() as u8 * 20))
    }

    async fn generate_sequence(
        &self,
        request: &SequenceRequest,
    ) -> Result<Vec<Vec<u8>>, GatewayError> {
        self.record(Call::Sequence(request.clone()), Target::Sequence)?;
        let len = self
            .sequence_len
            .lock()
            .unwrap()
            .unwrap_or(request.frame_count as usize);
        Ok((0..len).map(|i| png(i as u8 * 30)).collect())
    }
}

// ---------------------------------------------------------------------------
// Text gateway and sleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeText {
    pub fail: Mutex<bool>,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGateway for FakeText {
    async fn generate_text(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if *self.fail.lock().unwrap() {
            return Err(GatewayError::Connection("scripted".into()));
        }
        Ok("Born under a pixel moon.".into())
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Persistence wrappers
// ---------------------------------------------------------------------------

/// Memory repository that journals every save and can be told to fail them.
pub struct RecordingRepo {
    inner: Arc<MemoryCharacterRepo>,
    journal: Arc<Journal>,
    pub fail_saves: AtomicBool,
}

impl RecordingRepo {
    pub fn new(inner: Arc<MemoryCharacterRepo>, journal: Arc<Journal>) -> Self {
        Self {
            inner,
            journal,
            fail_saves: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CharacterRepository for RecordingRepo {
    async fn load(&self, id: CharacterId) -> Result<Option<Character>, CoreError> {
        self.inner.load(id).await
    }

    async fn save(&self, character: &Character) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("database unavailable".into()));
        }
        self.journal.push(Event::Save {
            has_reference: character.reference_image.is_some(),
            images: character.images().len(),
        });
        self.inner.save(character).await
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, CoreError> {
        self.inner.delete(id).await
    }

    async fn list_by_status(
        &self,
        status: CharacterStatus,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<Character>, CoreError> {
        self.inner.list_by_status(status, limit, skip).await
    }

    async fn count_by_status(&self, status: CharacterStatus) -> Result<i64, CoreError> {
        self.inner.count_by_status(status).await
    }
}

/// Blob store that refuses writes to paths ending in `suffix`.
pub struct FailingWrites {
    inner: Arc<MemoryBlobStore>,
    suffix: String,
}

impl FailingWrites {
    pub fn new(inner: Arc<MemoryBlobStore>, suffix: &str) -> Self {
        Self {
            inner,
            suffix: suffix.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for FailingWrites {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<BlobPointer, CoreError> {
        if logical_path.ends_with(&self.suffix) {
            return Err(CoreError::Storage("disk full".into()));
        }
        self.inner.put(bytes, logical_path).await
    }

    async fn get(&self, pointer: &BlobPointer) -> Result<Vec<u8>, CoreError> {
        self.inner.get(pointer).await
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, CoreError> {
        self.inner.delete(logical_path).await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct TestEnv {
    pub images: Arc<FakeImages>,
    pub text: Arc<FakeText>,
    pub repo: Arc<MemoryCharacterRepo>,
    pub recording_repo: Arc<RecordingRepo>,
    pub blobs: Arc<MemoryBlobStore>,
    pub sleeper: Arc<RecordingSleeper>,
    pub ctx: GenerationContext,
}

impl TestEnv {
    pub fn new() -> Self {
        let images = Arc::new(FakeImages::default());
        let text = Arc::new(FakeText::default());
        let repo = Arc::new(MemoryCharacterRepo::new());
        let recording_repo = Arc::new(RecordingRepo::new(repo.clone(), images.journal.clone()));
        let blobs = Arc::new(MemoryBlobStore::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        let ctx = GenerationContext {
            images: images.clone(),
            text: text.clone(),
            repo: recording_repo.clone(),
            blobs: blobs.clone(),
            sleeper: sleeper.clone(),
            config: PipelineConfig::default(),
        };
        Self {
            images,
            text,
            repo,
            recording_repo,
            blobs,
            sleeper,
            ctx,
        }
    }

    pub fn service(&self) -> GenerationService {
        GenerationService::new(self.ctx.clone())
    }

    /// Service whose blob writes to paths ending in `suffix` fail.
    pub fn service_failing_writes(&self, suffix: &str) -> GenerationService {
        let mut ctx = self.ctx.clone();
        ctx.blobs = Arc::new(FailingWrites::new(self.blobs.clone(), suffix));
        GenerationService::new(ctx)
    }
}

pub fn form(image_count: u32) -> CharacterForm {
    CharacterForm {
        name: "Kage".into(),
        character_class: Some("ninja".into()),
        appearance: Some("slim figure in a dark hood".into()),
        special_features: Some("glowing red scarf".into()),
        personality: Some("quiet".into()),
        image_count: Some(image_count),
        ..Default::default()
    }
}
