use image::{ImageFormat, Rgb, RgbImage};
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::thread;
use vision_core::config::{CameraConfig, SourceMode};
use vision_core::detection::{center_region, read_region};
use vision_core::source::{
    http_agent, open_source, CaptureSource, FailurePolicy, FrameSource, MjpegStream, SourceError,
};
use vision_detection::ColorName;

fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

fn image_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn mjpeg_response(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut response = b"HTTP/1.1 200 OK\r\n\
        Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\
        Connection: close\r\n\r\n"
        .to_vec();
    for part in parts {
        response.extend_from_slice(b"--frame\r\n");
        response.extend_from_slice(b"Content-Type: image/jpeg\r\n");
        response.extend_from_slice(format!("Content-Length: {}\r\n\r\n", part.len()).as_bytes());
        response.extend_from_slice(part);
        response.extend_from_slice(b"\r\n");
    }
    response
}

// Answers one connection per canned response, then stops listening.
fn serve(responses: Vec<Vec<u8>>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let Ok(read_half) = stream.try_clone() else {
                return;
            };
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => {}
                }
            }
            let _ = stream.write_all(&response);
        }
    });

    port
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn camera(stream_port: u16, http_port: u16, mode: SourceMode) -> CameraConfig {
    CameraConfig {
        host: "127.0.0.1".to_string(),
        mode,
        stream_port,
        http_port,
        connect_timeout_ms: 2_000,
        read_timeout_ms: 2_000,
        ..CameraConfig::default()
    }
}

fn center_color(source: &mut dyn FrameSource) -> ColorName {
    let frame = source.next_frame().unwrap();
    let region = center_region(&frame, 50).unwrap();
    read_region(&frame, region).unwrap().color
}

#[test]
fn stream_yields_frames_then_reports_end_as_transient() {
    let parts = vec![jpeg(64, 64, [0, 255, 0]), jpeg(64, 64, [0, 0, 255])];
    let port = serve(vec![mjpeg_response(&parts)]);
    let cfg = camera(port, closed_port(), SourceMode::Stream);

    let mut stream = MjpegStream::connect(&http_agent(&cfg), &cfg.stream_url()).unwrap();
    assert_eq!(stream.describe(), format!("http://127.0.0.1:{port}/stream"));

    assert_eq!(center_color(&mut stream), ColorName::Green);
    assert_eq!(center_color(&mut stream), ColorName::Blue);

    for _ in 0..2 {
        let err = stream.next_frame().unwrap_err();
        assert!(err.is_transient(), "{err}");
    }
}

#[test]
fn non_multipart_stream_fails_to_open() {
    let port = serve(vec![image_response("200 OK", &png(8, 8, [0, 0, 0]))]);
    let cfg = camera(port, closed_port(), SourceMode::Stream);

    let err = MjpegStream::connect(&http_agent(&cfg), &cfg.stream_url())
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::Open { .. }));
}

#[test]
fn stream_mode_falls_back_to_capture() {
    let http_port = serve(vec![
        image_response("200 OK", &png(100, 80, [255, 255, 255])),
        image_response("500 Internal Server Error", b""),
        image_response("200 OK", &png(100, 80, [255, 0, 0])),
    ]);
    let cfg = camera(closed_port(), http_port, SourceMode::Stream);

    let mut source = open_source(&cfg).unwrap();
    assert_eq!(
        source.describe(),
        format!("http://127.0.0.1:{http_port}/capture")
    );

    assert_eq!(center_color(&mut source), ColorName::White);
    let err = source.next_frame().unwrap_err();
    assert!(err.is_transient(), "{err}");
    assert_eq!(center_color(&mut source), ColorName::Red);
}

#[test]
fn stream_mode_without_any_endpoint_fails() {
    let cfg = camera(closed_port(), closed_port(), SourceMode::Stream);
    let err = open_source(&cfg).err().unwrap();
    assert!(matches!(err, SourceError::Open { .. }));
    assert!(!err.is_transient());
}

#[test]
fn polling_failure_is_fatal() {
    let http_port = serve(vec![
        image_response("200 OK", &png(60, 60, [0, 0, 255])),
        image_response("200 OK", b"definitely not an image"),
    ]);
    let cfg = camera(closed_port(), http_port, SourceMode::Polling);

    let mut source = open_source(&cfg).unwrap();
    assert_eq!(
        source.describe(),
        format!("http://127.0.0.1:{http_port}/cam-stream")
    );
    assert_eq!(center_color(&mut source), ColorName::Blue);

    let err = source.next_frame().unwrap_err();
    assert!(matches!(err, SourceError::Fatal(_)), "{err}");
}

#[test]
fn capture_open_requires_a_decodable_image() {
    let http_port = serve(vec![image_response("404 Not Found", b"")]);
    let cfg = camera(closed_port(), http_port, SourceMode::Stream);

    let err = CaptureSource::open(http_agent(&cfg), cfg.capture_url(), FailurePolicy::Retry)
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::Open { .. }));
}
