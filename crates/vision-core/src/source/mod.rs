mod capture;
mod multipart;
mod stream;

pub use capture::CaptureSource;
pub use multipart::{boundary_from_content_type, MultipartError, MultipartReader};
pub use stream::MjpegStream;

use crate::config::{CameraConfig, SourceMode};
use crate::frame::{Frame, FrameError};
use thiserror::Error;

/// Largest still image accepted from a capture URL.
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("response is not a multipart stream (content type {0:?})")]
    NotMultipart(String),

    #[error("image exceeds {} bytes", MAX_IMAGE_BYTES)]
    TooLarge,

    #[error("stream ended")]
    StreamEnded,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("frame unavailable: {0}")]
    Unavailable(#[source] FetchError),

    #[error("frame source failed: {0}")]
    Fatal(#[source] FetchError),
}

impl SourceError {
    /// Transient failures are retried by the caller; everything else ends the session.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// How a source reports a failed read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    Retry,
    Abort,
}

impl FailurePolicy {
    pub fn reject(self, err: FetchError) -> SourceError {
        match self {
            FailurePolicy::Retry => SourceError::Unavailable(err),
            FailurePolicy::Abort => SourceError::Fatal(err),
        }
    }
}

/// Produces frames; may fail transiently or fatally.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError>;

    /// URL (or other label) the frames come from, for logging.
    fn describe(&self) -> &str;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        (**self).next_frame()
    }

    fn describe(&self) -> &str {
        (**self).describe()
    }
}

pub fn http_agent(camera: &CameraConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(camera.connect_timeout())
        .timeout_read(camera.read_timeout())
        .build()
}

/// Opens the frame source selected by `camera.mode`.
///
/// Stream mode falls back to single captures when the stream will not open.
/// Polling mode does not touch the network until the first frame is requested.
pub fn open_source(camera: &CameraConfig) -> Result<Box<dyn FrameSource>, SourceError> {
    let agent = http_agent(camera);

    match camera.mode {
        SourceMode::Stream => {
            let stream_url = camera.stream_url();
            match MjpegStream::connect(&agent, &stream_url) {
                Ok(stream) => Ok(Box::new(stream)),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to open stream, trying alternative URL...");
                    let capture =
                        CaptureSource::open(agent, camera.capture_url(), FailurePolicy::Retry)?;
                    Ok(Box::new(capture))
                }
            }
        }
        SourceMode::Polling => Ok(Box::new(CaptureSource::new(
            agent,
            camera.poll_url(),
            FailurePolicy::Abort,
        ))),
    }
}
