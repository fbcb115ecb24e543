use super::multipart::{boundary_from_content_type, MultipartReader};
use super::{FetchError, FrameSource, SourceError};
use crate::frame::Frame;
use std::io::{BufReader, Read};

type Body = BufReader<Box<dyn Read + Send + Sync + 'static>>;

/// A held-open MJPEG connection. Once the server closes it every read is a
/// transient failure; the stream is never reopened.
pub struct MjpegStream {
    url: String,
    parts: MultipartReader<Body>,
    ended: bool,
}

impl MjpegStream {
    pub fn connect(agent: &ureq::Agent, url: &str) -> Result<Self, SourceError> {
        let open_error = |source: FetchError| SourceError::Open {
            url: url.to_string(),
            source,
        };

        let response = agent
            .get(url)
            .call()
            .map_err(|e| open_error(Box::new(e).into()))?;

        let content_type = response.header("Content-Type").unwrap_or("").to_string();
        let boundary = boundary_from_content_type(&content_type)
            .ok_or_else(|| open_error(FetchError::NotMultipart(content_type.clone())))?;

        tracing::debug!(url, boundary = %boundary, "Stream opened");
        Ok(Self {
            url: url.to_string(),
            parts: MultipartReader::new(BufReader::new(response.into_reader()), &boundary),
            ended: false,
        })
    }
}

impl FrameSource for MjpegStream {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if self.ended {
            return Err(SourceError::Unavailable(FetchError::StreamEnded));
        }

        match self.parts.next_part() {
            Ok(Some(bytes)) => {
                Frame::decode(&bytes).map_err(|e| SourceError::Unavailable(e.into()))
            }
            Ok(None) => {
                tracing::warn!(url = %self.url, "Camera closed the stream");
                self.ended = true;
                Err(SourceError::Unavailable(FetchError::StreamEnded))
            }
            Err(e) => Err(SourceError::Unavailable(e.into())),
        }
    }

    fn describe(&self) -> &str {
        &self.url
    }
}
