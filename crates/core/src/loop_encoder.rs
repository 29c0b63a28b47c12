//! Frame sequence encoder: ordered raster frames in, looping GIF out.
//!
//! Every frame is written as a complete full-canvas bitmap with
//! "restore to background" disposal, so transparent regions of one frame
//! never show the previous frame through them. `image`'s own GIF encoder
//! always uses keep-previous disposal, hence the direct use of `gif`.
//!
//! The encoder is synchronous and CPU bound; async callers run it on a
//! blocking thread.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbaImage;

/// Per-frame display duration used when the caller has no preference.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 200;
/// Loop forever.
pub const INFINITE_LOOP: u16 = 0;

/// Where a frame's encoded raster comes from.
#[derive(Debug, Clone)]
pub enum FrameSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A raster frame tagged with its position in the sequence.
#[derive(Debug, Clone)]
pub struct SequencedFrame {
    pub index: u32,
    pub source: FrameSource,
}

impl SequencedFrame {
    pub fn from_bytes(index: u32, bytes: Vec<u8>) -> Self {
        Self {
            index,
            source: FrameSource::Bytes(bytes),
        }
    }

    pub fn from_path(index: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            source: FrameSource::Path(path.into()),
        }
    }
}

/// Result of a successful encode.
#[derive(Debug, Clone)]
pub struct EncodedLoop {
    pub bytes: Vec<u8>,
    pub frame_count: u32,
    pub width: u32,
    pub height: u32,
    pub frame_duration_ms: u32,
    pub loop_count: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopEncodeError {
    #[error("Cannot encode a loop from an empty frame list")]
    Empty,

    #[error("Frame {index} not found at {path}")]
    MissingFrame { index: u32, path: PathBuf },

    #[error("Frame {index} could not be decoded: {source}")]
    Decode {
        index: u32,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame dimensions {width}x{height} exceed the GIF limit")]
    TooLarge { width: u32, height: u32 },

    #[error("GIF encoding failed: {0}")]
    Encode(#[from] gif::EncodingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode `frames` into an in-memory looping GIF.
///
/// Frames are ordered by `index` regardless of input order. Every frame
/// is resized to the first frame's dimensions. `loop_count` 0 loops
/// forever.
pub fn encode_loop(
    mut frames: Vec<SequencedFrame>,
    frame_duration_ms: u32,
    loop_count: u16,
) -> Result<EncodedLoop, LoopEncodeError> {
    if frames.is_empty() {
        return Err(LoopEncodeError::Empty);
    }
    frames.sort_by_key(|f| f.index);

    let mut rasters = Vec::with_capacity(frames.len());
    for frame in &frames {
        rasters.push(decode_frame(frame)?);
    }

    let (width, height) = rasters[0].dimensions();
    let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(LoopEncodeError::TooLarge { width, height }),
    };

    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, w16, h16, &[])?;
        encoder.set_repeat(match loop_count {
            INFINITE_LOOP => gif::Repeat::Infinite,
            n => gif::Repeat::Finite(n),
        })?;

        let delay_cs = u16::try_from(frame_duration_ms / 10).unwrap_or(u16::MAX);
        for raster in rasters {
            let raster = if raster.dimensions() == (width, height) {
                raster
            } else {
                image::imageops::resize(&raster, width, height, FilterType::Lanczos3)
            };
            let mut pixels = raster.into_raw();
            let mut gif_frame = gif::Frame::from_rgba_speed(w16, h16, &mut pixels, 10);
            gif_frame.delay = delay_cs;
            gif_frame.dispose = gif::DisposalMethod::Background;
            encoder.write_frame(&gif_frame)?;
        }
    }

    Ok(EncodedLoop {
        bytes,
        frame_count: frames.len() as u32,
        width,
        height,
        frame_duration_ms,
        loop_count,
    })
}

/// Encode and write the loop to `destination`, creating parent
/// directories as needed.
pub fn encode_loop_to_file(
    frames: Vec<SequencedFrame>,
    frame_duration_ms: u32,
    loop_count: u16,
    destination: &Path,
) -> Result<EncodedLoop, LoopEncodeError> {
    let encoded = encode_loop(frames, frame_duration_ms, loop_count)?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(destination, &encoded.bytes)?;
    Ok(encoded)
}

fn decode_frame(frame: &SequencedFrame) -> Result<RgbaImage, LoopEncodeError> {
    let bytes = match &frame.source {
        FrameSource::Bytes(bytes) => std::borrow::Cow::Borrowed(bytes.as_slice()),
        FrameSource::Path(path) => match std::fs::read(path) {
            Ok(bytes) => std::borrow::Cow::Owned(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoopEncodeError::MissingFrame {
                    index: frame.index,
                    path: path.clone(),
                })
            }
            Err(e) => return Err(LoopEncodeError::Io(e)),
        },
    };

    image::ImageReader::new(Cursor::new(bytes.as_ref()))
        .with_guessed_format()?
        .decode()
        .map(|img| img.to_rgba8())
        .map_err(|source| LoopEncodeError::Decode {
            index: frame.index,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    struct DecodedFrame {
        width: u16,
        height: u16,
        delay: u16,
        dispose: gif::DisposalMethod,
        first_pixel: [u8; 4],
    }

    fn decode_gif(bytes: &[u8]) -> Vec<DecodedFrame> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(bytes).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push(DecodedFrame {
                width: frame.width,
                height: frame.height,
                delay: frame.delay,
                dispose: frame.dispose,
                first_pixel: [
                    frame.buffer[0],
                    frame.buffer[1],
                    frame.buffer[2],
                    frame.buffer[3],
                ],
            });
        }
        frames
    }

    fn dominant_channel(pixel: [u8; 4]) -> usize {
        (0..3).max_by_key(|&c| pixel[c]).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            encode_loop(vec![], DEFAULT_FRAME_DURATION_MS, INFINITE_LOOP),
            Err(LoopEncodeError::Empty)
        ));
    }

    #[test]
    fn missing_path_names_the_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frames = vec![
            SequencedFrame::from_bytes(0, png(4, 4, RED)),
            SequencedFrame::from_path(1, dir.path().join("nope.png")),
        ];
        match encode_loop(frames, 200, 0) {
            Err(LoopEncodeError::MissingFrame { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected MissingFrame, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let frames = vec![SequencedFrame::from_bytes(0, b"not an image".to_vec())];
        assert!(encode_loop(frames, 200, 0).is_err());
    }

    #[test]
    fn full_canvas_frames_with_background_disposal() {
        let frames = vec![
            SequencedFrame::from_bytes(0, png(8, 8, RED)),
            SequencedFrame::from_bytes(1, png(8, 8, GREEN)),
        ];
        let encoded = encode_loop(frames, 200, INFINITE_LOOP).unwrap();
        assert_eq!(encoded.frame_count, 2);

        let decoded = decode_gif(&encoded.bytes);
        assert_eq!(decoded.len(), 2);
        for frame in &decoded {
            assert_eq!((frame.width, frame.height), (8, 8));
            assert_eq!(frame.delay, 20);
            assert_eq!(frame.dispose, gif::DisposalMethod::Background);
        }
    }

    #[test]
    fn out_of_order_frames_are_encoded_in_index_order() {
        let frames = vec![
            SequencedFrame::from_bytes(2, png(8, 8, BLUE)),
            SequencedFrame::from_bytes(0, png(8, 8, RED)),
            SequencedFrame::from_bytes(1, png(8, 8, GREEN)),
        ];
        let encoded = encode_loop(frames, 200, 0).unwrap();
        let channels: Vec<_> = decode_gif(&encoded.bytes)
            .iter()
            .map(|f| dominant_channel(f.first_pixel))
            .collect();
        assert_eq!(channels, vec![0, 1, 2]);
    }

    #[test]
    fn later_frames_resized_to_first() {
        let frames = vec![
            SequencedFrame::from_bytes(0, png(8, 8, RED)),
            SequencedFrame::from_bytes(1, png(16, 12, GREEN)),
        ];
        let encoded = encode_loop(frames, 100, 0).unwrap();
        assert_eq!((encoded.width, encoded.height), (8, 8));
        for frame in decode_gif(&encoded.bytes) {
            assert_eq!((frame.width, frame.height), (8, 8));
            assert_eq!(frame.delay, 10);
        }
    }

    #[test]
    fn encoding_is_idempotent() {
        let frames = || {
            vec![
                SequencedFrame::from_bytes(0, png(8, 8, RED)),
                SequencedFrame::from_bytes(1, png(8, 8, BLUE)),
            ]
        };
        let a = encode_loop(frames(), 200, 0).unwrap();
        let b = encode_loop(frames(), 200, 0).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn writes_to_file_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        let f0 = dir.path().join("frame_0.png");
        let f1 = dir.path().join("frame_1.png");
        std::fs::write(&f0, png(8, 8, RED)).unwrap();
        std::fs::write(&f1, png(8, 8, GREEN)).unwrap();

        let dest = dir.path().join("out/walk_south.gif");
        let encoded = encode_loop_to_file(
            vec![
                SequencedFrame::from_path(1, &f1),
                SequencedFrame::from_path(0, &f0),
            ],
            200,
            3,
            &dest,
        )
        .unwrap();

        assert_eq!(encoded.loop_count, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), encoded.bytes);
    }
}
