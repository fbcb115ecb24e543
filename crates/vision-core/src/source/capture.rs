use super::{FailurePolicy, FetchError, FrameSource, SourceError, MAX_IMAGE_BYTES};
use crate::frame::Frame;
use std::io::Read;

/// Fetches one still image per frame from a capture URL.
pub struct CaptureSource {
    agent: ureq::Agent,
    url: String,
    policy: FailurePolicy,
    pending: Option<Frame>,
}

impl CaptureSource {
    pub fn new(agent: ureq::Agent, url: String, policy: FailurePolicy) -> Self {
        Self {
            agent,
            url,
            policy,
            pending: None,
        }
    }

    /// Fetches a first image to prove the URL works; it becomes the first frame.
    pub fn open(
        agent: ureq::Agent,
        url: String,
        policy: FailurePolicy,
    ) -> Result<Self, SourceError> {
        let mut source = Self::new(agent, url, policy);
        match source.fetch() {
            Ok(frame) => {
                source.pending = Some(frame);
                Ok(source)
            }
            Err(e) => Err(SourceError::Open {
                url: source.url,
                source: e,
            }),
        }
    }

    fn fetch(&self) -> Result<Frame, FetchError> {
        let response = self.agent.get(&self.url).call().map_err(Box::new)?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_IMAGE_BYTES as u64 + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(FetchError::TooLarge);
        }

        Ok(Frame::decode(&bytes)?)
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }
        self.fetch().map_err(|e| self.policy.reject(e))
    }

    fn describe(&self) -> &str {
        &self.url
    }
}
