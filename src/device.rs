//! # Device Capabilities
//!
//! The narrow interface programs use to reach the hardware: the
//! [`Display`], an optional [`Radio`], and the [`Clock`] and [`Buttons`]
//! every [`Board`] provides. Programs never hold the board; on each
//! resume they get an [`Io`] handle that borrows it for that one step.

use core::fmt::Write;

use crate::config::{Config, RadioConfig, BRIGHTNESS_MAX, DISPLAY_HEIGHT, DISPLAY_WIDTH, MAX_RADIO_FRAME};
use crate::error::{Error, Result};
use crate::input::{Buttons, InputEvent, InputPoller};
use crate::time::{Clock, Millis};

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// An off-screen 5×5 frame of brightness values `0..=BRIGHTNESS_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Image {
    rows: [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

/// Text form of an [`Image`], as sent over the radio.
pub type Frame = heapless::String<MAX_RADIO_FRAME>;

impl Image {
    pub const fn blank() -> Self {
        Self {
            rows: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// Set one pixel. Out-of-bounds writes are ignored; brightness is
    /// clamped to `BRIGHTNESS_MAX`.
    pub fn set_pixel(&mut self, x: usize, y: usize, brightness: u8) {
        if x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT {
            self.rows[y][x] = brightness.min(BRIGHTNESS_MAX);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Brightness values, row-major.
    #[inline]
    pub fn rows(&self) -> &[[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT] {
        &self.rows
    }

    /// Render as `Image('09990:...:')`, one digit per pixel, rows
    /// separated by `:`.
    pub fn to_frame(&self) -> Result<Frame> {
        let mut frame = Frame::new();
        let overflow = Error::FrameTooLong {
            len: MAX_RADIO_FRAME + 1,
            max: MAX_RADIO_FRAME,
        };
        frame.push_str("Image('").map_err(|_| overflow)?;
        for row in &self.rows {
            for &value in row {
                write!(frame, "{}", value).map_err(|_| overflow)?;
            }
            frame.push(':').map_err(|_| overflow)?;
        }
        frame.push_str("')").map_err(|_| overflow)?;
        Ok(frame)
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The LED matrix. Write-only.
pub trait Display {
    fn set_pixel(&mut self, x: usize, y: usize, brightness: u8);

    /// Show a whole frame.
    fn show(&mut self, image: &Image) {
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                self.set_pixel(x, y, image.pixel(x, y).unwrap_or(0));
            }
        }
    }

    /// Scroll `text` across the display. With `wait` the call returns
    /// once the text has left the screen.
    fn scroll(&mut self, text: &str, wait: bool);
}

/// Fire-and-forget packet radio.
pub trait Radio {
    fn configure(&mut self, config: &RadioConfig);

    fn send(&mut self, frame: &[u8]);
}

/// Everything a program can touch.
pub trait Board: Clock + Buttons + Display {
    /// The radio, on boards that have one.
    fn radio(&mut self) -> Option<&mut dyn Radio> {
        None
    }
}

// ---------------------------------------------------------------------------
// Io handle
// ---------------------------------------------------------------------------

/// Borrowed access to the board and configuration for one resume step.
pub struct Io<'a> {
    board: &'a mut dyn Board,
    config: &'a Config,
}

impl<'a> Io<'a> {
    pub fn new(board: &'a mut dyn Board, config: &'a Config) -> Self {
        Self { board, config }
    }

    #[inline]
    pub fn now(&self) -> Millis {
        self.board.now()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        self.config
    }

    /// Consume the button counters. See [`InputPoller::poll`].
    pub fn poll_input(&mut self) -> Option<InputEvent> {
        InputPoller::poll(&mut *self.board)
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, brightness: u8) {
        self.board.set_pixel(x, y, brightness.min(BRIGHTNESS_MAX));
    }

    pub fn show(&mut self, image: &Image) {
        self.board.show(image);
    }

    pub fn scroll(&mut self, text: &str, wait: bool) {
        self.board.scroll(text, wait);
    }

    /// Send `image` over the radio when broadcasting is enabled and the
    /// board has a radio. Returns whether a frame went out.
    pub fn broadcast(&mut self, image: &Image) -> Result<bool> {
        if !self.config.broadcast {
            return Ok(false);
        }
        let max = self.config.radio.length;
        let Some(radio) = self.board.radio() else {
            return Ok(false);
        };
        let frame = image.to_frame()?;
        if frame.len() > max {
            return Err(Error::FrameTooLong {
                len: frame.len(),
                max,
            });
        }
        radio.send(frame.as_bytes());
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
