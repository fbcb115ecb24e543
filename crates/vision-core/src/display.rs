use crate::frame::Frame;
use minifb::{Key, Window, WindowOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
}

/// Somewhere annotated frames are shown, and the quit signal comes from.
pub trait Display {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Processes pending window events without drawing a new frame.
    /// Called while no frame is available, so input keeps flowing.
    fn pump_events(&mut self);

    /// Polled after every `present` and `pump_events`.
    fn quit_requested(&self) -> bool;
}

/// A single desktop window sized to the first frame. Closed when dropped.
pub struct WindowDisplay {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl WindowDisplay {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
            buffer: Vec::new(),
        }
    }
}

impl Display for WindowDisplay {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        if self.window.is_none() {
            tracing::debug!(width, height, title = %self.title, "Opening window");
            self.window = Some(Window::new(
                &self.title,
                width,
                height,
                WindowOptions::default(),
            )?);
        }

        frame.write_u32(&mut self.buffer);
        if let Some(window) = self.window.as_mut() {
            window.update_with_buffer(&self.buffer, width, height)?;
        }
        Ok(())
    }

    // minifb only reads input inside `update`/`update_with_buffer`.
    fn pump_events(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.update();
        }
    }

    fn quit_requested(&self) -> bool {
        self.window
            .as_ref()
            .is_some_and(|window| !window.is_open() || window.is_key_down(Key::Q))
    }
}
