//! Host-side stand-ins for the board, used by the unit tests.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

use crate::config::{RadioConfig, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::device::{Board, Display, Radio};
use crate::input::Buttons;
use crate::time::{Clock, Millis};

/// A clock that only moves when told to, or by a fixed step on every
/// read. Shareable through `Rc`.
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<Millis>,
    step: Millis,
}

impl MockClock {
    pub fn new(now: Millis) -> Self {
        Self {
            now: Cell::new(now),
            step: 0,
        }
    }

    /// A clock that moves `step` ms forward each time it is read.
    pub fn ticking(now: Millis, step: Millis) -> Self {
        Self {
            now: Cell::new(now),
            step,
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Millis {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Records configuration and every frame sent.
#[derive(Debug, Default)]
pub struct MockRadio {
    config: Option<RadioConfig>,
    sent: Vec<Vec<u8>>,
}

impl Radio for MockRadio {
    fn configure(&mut self, config: &RadioConfig) {
        self.config = Some(*config);
    }

    fn send(&mut self, frame: &[u8]) {
        self.sent.push(frame.to_vec());
    }
}

/// Scripted board: time is set by hand, presses are queued by hand and
/// the display is a plain pixel buffer.
#[derive(Debug)]
pub struct MockBoard {
    now: Millis,
    a_presses: u32,
    b_presses: u32,
    interrupt: bool,
    pixels: [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
    scrolled: Vec<String>,
    radio: Option<MockRadio>,
}

impl MockBoard {
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            a_presses: 0,
            b_presses: 0,
            interrupt: false,
            pixels: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            scrolled: Vec::new(),
            radio: None,
        }
    }

    pub fn with_radio(mut self) -> Self {
        self.radio = Some(MockRadio::default());
        self
    }

    pub fn set_time(&mut self, now: Millis) {
        self.now = now;
    }

    pub fn advance(&mut self, ms: Millis) {
        self.now += ms;
    }

    pub fn press_a(&mut self, times: u32) {
        self.a_presses += times;
    }

    pub fn press_b(&mut self, times: u32) {
        self.b_presses += times;
    }

    pub fn raise_interrupt(&mut self) {
        self.interrupt = true;
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y][x]
    }

    pub fn scrolled(&self) -> &[String] {
        &self.scrolled
    }

    pub fn sent_frames(&self) -> &[Vec<u8>] {
        self.radio.as_ref().map_or(&[], |radio| radio.sent.as_slice())
    }

    pub fn radio_config(&self) -> Option<RadioConfig> {
        self.radio.as_ref().and_then(|radio| radio.config)
    }
}

impl Clock for MockBoard {
    fn now(&self) -> Millis {
        self.now
    }
}

impl Buttons for MockBoard {
    fn button_a_presses(&mut self) -> u32 {
        core::mem::take(&mut self.a_presses)
    }

    fn button_b_presses(&mut self) -> u32 {
        core::mem::take(&mut self.b_presses)
    }

    fn interrupt_requested(&mut self) -> bool {
        core::mem::take(&mut self.interrupt)
    }
}

impl Display for MockBoard {
    fn set_pixel(&mut self, x: usize, y: usize, brightness: u8) {
        if x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT {
            self.pixels[y][x] = brightness;
        }
    }

    fn scroll(&mut self, text: &str, _wait: bool) {
        self.scrolled.push(text.to_string());
    }
}

impl Board for MockBoard {
    fn radio(&mut self) -> Option<&mut dyn Radio> {
        self.radio.as_mut().map(|radio| radio as &mut dyn Radio)
    }
}
