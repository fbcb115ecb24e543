use crate::config::Config;
use crate::detection::{center_region, draw_label, draw_outline, read_region};
use crate::display::{Display, DisplayError};
use crate::frame::Frame;
use crate::source::{FrameSource, SourceError};
use std::thread;
use std::time::{Duration, Instant};
use vision_detection::ColorName;

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub rect_size: u32,
    /// Sleep after every displayed frame.
    pub frame_delay: Duration,
    /// Sleep after a transient source failure.
    pub retry_delay: Duration,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rect_size: config.detection.rect_size,
            frame_delay: config.display.frame_delay(),
            retry_delay: config.display.retry_delay(),
        }
    }
}

#[derive(Debug)]
pub enum SessionEnd {
    Quit,
    SourceFailed(SourceError),
    DisplayFailed(DisplayError),
}

#[derive(Debug)]
pub struct SessionReport {
    pub frames: u64,
    pub retries: u64,
    pub last_color: Option<ColorName>,
    pub end: SessionEnd,
}

/// Owns the frame source and the display for the whole loop; both are
/// dropped, and so released, when [`Session::run`] returns.
pub struct Session<S, D> {
    source: S,
    display: D,
    options: SessionOptions,
}

impl<S: FrameSource, D: Display> Session<S, D> {
    pub fn new(source: S, display: D, options: SessionOptions) -> Self {
        Self {
            source,
            display,
            options,
        }
    }

    pub fn run(mut self) -> SessionReport {
        let mut frames: u64 = 0;
        let mut retries: u64 = 0;
        let mut last_color = None;

        let mut window_frames: u64 = 0;
        let mut last_log = Instant::now();

        let end = loop {
            let mut frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "Failed to get frame, retrying...");
                    retries += 1;
                    self.display.pump_events();
                    if self.display.quit_requested() {
                        tracing::info!("Quit requested");
                        break SessionEnd::Quit;
                    }
                    thread::sleep(self.options.retry_delay);
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Frame source failed");
                    break SessionEnd::SourceFailed(e);
                }
            };

            if let Some(color) = self.annotate(&mut frame) {
                last_color = Some(color);
            }

            if let Err(e) = self.display.present(&frame) {
                tracing::error!(error = %e, "Could not display frame");
                break SessionEnd::DisplayFailed(e);
            }
            frames += 1;
            window_frames += 1;

            if self.display.quit_requested() {
                tracing::info!("Quit requested");
                break SessionEnd::Quit;
            }

            let elapsed = last_log.elapsed();
            if elapsed >= Duration::from_secs(1) {
                tracing::debug!(
                    frames_in_window = window_frames,
                    fps = window_frames as f64 / elapsed.as_secs_f64(),
                    color = ?last_color
                );
                window_frames = 0;
                last_log = Instant::now();
            }

            thread::sleep(self.options.frame_delay);
        };

        SessionReport {
            frames,
            retries,
            last_color,
            end,
        }
    }

    // Samples before drawing so the overlay never lands in the sampled pixels.
    fn annotate(&self, frame: &mut Frame) -> Option<ColorName> {
        let reading = center_region(frame, self.options.rect_size)
            .and_then(|region| read_region(frame, region));
        draw_outline(frame, self.options.rect_size);

        match reading {
            Ok(reading) => {
                tracing::trace!(sample = ?reading.sample, color = %reading.color);
                draw_label(frame, reading.color);
                Some(reading.color)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Color processing error");
                None
            }
        }
    }
}
