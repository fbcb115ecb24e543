use std::io::{self, BufRead, Read};
use thiserror::Error;

pub const MAX_HEADER_LINES: usize = 32;
pub const MAX_PART_BYTES: usize = 8 * 1024 * 1024;
const MAX_LINE_BYTES: u64 = 4096;
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("I/O error reading multipart body: {0}")]
    Io(#[from] io::Error),

    #[error("part header block exceeds {} lines", MAX_HEADER_LINES)]
    TooManyHeaders,

    #[error("invalid Content-Length header {0:?}")]
    BadLength(String),

    #[error("part of {0} bytes exceeds the size limit")]
    TooLarge(usize),

    #[error("stream ended inside a part")]
    Truncated,
}

/// Pulls the `boundary` parameter out of a `multipart/*` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let mime = params.next()?.trim();
    if !mime.to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }

    params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| {
            value
                .trim()
                .trim_matches('"')
                .trim_start_matches("--")
                .to_string()
        })
        .filter(|boundary| !boundary.is_empty())
}

/// Reads the parts of a `multipart/x-mixed-replace` body one at a time.
///
/// Bodies are sized by `Content-Length` when the part carries one, otherwise
/// they run to the JPEG end-of-image marker.
pub struct MultipartReader<R> {
    inner: R,
    delimiter: Vec<u8>,
    done: bool,
}

impl<R: BufRead> MultipartReader<R> {
    pub fn new(inner: R, boundary: &str) -> Self {
        Self {
            inner,
            delimiter: format!("--{boundary}").into_bytes(),
            done: false,
        }
    }

    /// Returns the next part body, or `None` once the close delimiter or EOF is reached.
    pub fn next_part(&mut self) -> Result<Option<Vec<u8>>, MultipartError> {
        if self.done || !self.seek_delimiter()? {
            self.done = true;
            return Ok(None);
        }

        match self.read_headers()? {
            Some(len) => self.read_sized(len).map(Some),
            None => self.read_to_eoi().map(Some),
        }
    }

    // Skips preamble and trailing CRLFs up to the next delimiter line.
    fn seek_delimiter(&mut self) -> Result<bool, MultipartError> {
        while let Some(line) = self.read_line()? {
            let Some(rest) = line.trim_ascii().strip_prefix(self.delimiter.as_slice()) else {
                continue;
            };
            if rest == b"--" {
                return Ok(false);
            }
            if rest.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // Returns the Content-Length, if the part declared one.
    fn read_headers(&mut self) -> Result<Option<usize>, MultipartError> {
        let mut length = None;
        let mut count = 0;

        loop {
            let line = self.read_line()?.ok_or(MultipartError::Truncated)?;
            let line = line.trim_ascii();
            if line.is_empty() {
                return Ok(length);
            }

            count += 1;
            if count > MAX_HEADER_LINES {
                return Err(MultipartError::TooManyHeaders);
            }

            let Some(colon) = line.iter().position(|&b| b == b':') else {
                continue;
            };
            let (name, value) = (&line[..colon], &line[colon + 1..]);
            if name.trim_ascii().eq_ignore_ascii_case(b"content-length") {
                let text = String::from_utf8_lossy(value).trim().to_string();
                let len = text
                    .parse::<usize>()
                    .map_err(|_| MultipartError::BadLength(text))?;
                length = Some(len);
            }
        }
    }

    fn read_sized(&mut self, len: usize) -> Result<Vec<u8>, MultipartError> {
        if len > MAX_PART_BYTES {
            return Err(MultipartError::TooLarge(len));
        }
        let mut body = vec![0; len];
        self.inner.read_exact(&mut body).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => MultipartError::Truncated,
            _ => MultipartError::Io(e),
        })?;
        Ok(body)
    }

    fn read_to_eoi(&mut self) -> Result<Vec<u8>, MultipartError> {
        let mut body = Vec::new();
        loop {
            let remaining = (MAX_PART_BYTES + 1 - body.len()) as u64;
            let n = (&mut self.inner)
                .take(remaining)
                .read_until(JPEG_EOI[1], &mut body)?;
            if n == 0 {
                return Err(MultipartError::Truncated);
            }
            if body.ends_with(&JPEG_EOI) {
                return Ok(body);
            }
            if body.len() > MAX_PART_BYTES {
                return Err(MultipartError::TooLarge(body.len()));
            }
        }
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, MultipartError> {
        let mut line = Vec::new();
        let n = (&mut self.inner)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut line)?;
        Ok((n > 0).then_some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn part(body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"--frame\r\n");
        buf.extend_from_slice(b"Content-Type: image/jpeg\r\n");
        buf.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(b"\r\n");
        buf
    }

    fn reader(bytes: Vec<u8>) -> MultipartReader<Cursor<Vec<u8>>> {
        MultipartReader::new(Cursor::new(bytes), "frame")
    }

    #[test]
    fn boundary_parsing() {
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace; boundary=frame").as_deref(),
            Some("frame")
        );
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace;boundary=\"--myboundary\"")
                .as_deref(),
            Some("myboundary")
        );
        assert_eq!(
            boundary_from_content_type("Multipart/X-Mixed-Replace; charset=x; BOUNDARY=abc")
                .as_deref(),
            Some("abc")
        );
        assert_eq!(boundary_from_content_type("image/jpeg; boundary=frame"), None);
        assert_eq!(boundary_from_content_type("multipart/x-mixed-replace"), None);
        assert_eq!(boundary_from_content_type("multipart/x-mixed-replace; boundary="), None);
    }

    #[test]
    fn reads_sized_parts_in_order() {
        let mut bytes = b"preamble\r\n".to_vec();
        bytes.extend(part(b"first\r\n--frame\r\nnot a delimiter"));
        bytes.extend(part(b"second"));
        let mut parts = reader(bytes);

        assert_eq!(
            parts.next_part().unwrap().unwrap(),
            b"first\r\n--frame\r\nnot a delimiter"
        );
        assert_eq!(parts.next_part().unwrap().unwrap(), b"second");
        assert!(parts.next_part().unwrap().is_none());
        assert!(parts.next_part().unwrap().is_none());
    }

    #[test]
    fn reads_unsized_parts_to_end_of_image() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"\r\n--frame\r\ncontent-type: image/jpeg\r\n\r\n");
        bytes.extend_from_slice(&[0xFF, 0xD8, 0xD9, 0x01, 0xFF, 0xD9]);
        bytes.extend_from_slice(b"\r\n--frame\r\n\r\n");
        bytes.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let mut parts = reader(bytes);

        assert_eq!(
            parts.next_part().unwrap().unwrap(),
            [0xFF, 0xD8, 0xD9, 0x01, 0xFF, 0xD9]
        );
        assert_eq!(parts.next_part().unwrap().unwrap(), [0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn close_delimiter_ends_stream() {
        let mut bytes = part(b"only");
        bytes.extend_from_slice(b"--frame--\r\n");
        bytes.extend(part(b"ignored"));
        let mut parts = reader(bytes);

        assert_eq!(parts.next_part().unwrap().unwrap(), b"only");
        assert!(parts.next_part().unwrap().is_none());
        assert!(parts.next_part().unwrap().is_none());
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut bytes = part(b"0123456789");
        bytes.truncate(bytes.len() - 6);
        assert!(matches!(
            reader(bytes).next_part(),
            Err(MultipartError::Truncated)
        ));

        let bytes = b"--frame\r\nContent-Type: image/jpeg\r\n".to_vec();
        assert!(matches!(
            reader(bytes).next_part(),
            Err(MultipartError::Truncated)
        ));
    }

    #[test]
    fn bad_headers_are_rejected() {
        let bytes = b"--frame\r\nContent-Length: lots\r\n\r\n".to_vec();
        assert!(matches!(
            reader(bytes).next_part(),
            Err(MultipartError::BadLength(text)) if text == "lots"
        ));

        let mut bytes = b"--frame\r\n".to_vec();
        for i in 0..=MAX_HEADER_LINES {
            bytes.extend_from_slice(format!("X-Header-{i}: 1\r\n").as_bytes());
        }
        assert!(matches!(
            reader(bytes).next_part(),
            Err(MultipartError::TooManyHeaders)
        ));

        let bytes = format!("--frame\r\nContent-Length: {}\r\n\r\n", MAX_PART_BYTES + 1);
        assert!(matches!(
            reader(bytes.into_bytes()).next_part(),
            Err(MultipartError::TooLarge(_))
        ));
    }
}
