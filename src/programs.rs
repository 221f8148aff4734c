//! # Sample Programs
//!
//! Pattern generators that ship in the default rotation, plus a short
//! banner that finishes on its own. Each is a small state machine that
//! renders a frame, then sleeps for the configured pattern period.
//!
//! Pattern math is integer-only: brightness comes from lookup tables
//! indexed by a phase in thousandths of a cycle.

use alloc::boxed::Box;

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::device::{Image, Io};
use crate::registry::Program;
use crate::sleep::Sleep;
use crate::task::{Resume, Routine};
use crate::time::Millis;

/// `4.5 - 4.5 * sin(2πk / 20)`, rounded, for `k` in `0..20`.
const SINE_TABLE: [u8; 20] = [5, 3, 2, 1, 0, 0, 0, 1, 2, 3, 4, 6, 7, 8, 9, 9, 9, 8, 7, 6];

/// Distance of each pixel from the centre, in thousandths of a ripple
/// cycle.
const RADIAL_DISTANCE: [[u64; DISPLAY_WIDTH]; DISPLAY_HEIGHT] = [
    [500, 395, 354, 395, 500],
    [395, 250, 177, 250, 395],
    [354, 177, 0, 177, 354],
    [395, 250, 177, 250, 395],
    [500, 395, 354, 395, 500],
];

/// Length of one radial cycle in milliseconds.
const RADIAL_CYCLE_MS: u64 = 1000;

/// Length of one stripe cycle in milliseconds; each row (or diagonal)
/// is one step of `STRIPE_STEP_MS` behind the previous.
const STRIPE_CYCLE_MS: u64 = 500;
const STRIPE_STEP_MS: u64 = 100;

/// Pause after the banner text has left the screen.
const BANNER_HOLD_MS: Millis = 500;
const BANNER_TEXT: &str = "tickos";

/// The programs registered at boot, in rotation order.
pub const DEFAULT_PROGRAMS: [Program; 3] = [
    Program::new("radial_gradient", radial_gradient),
    Program::new("row_gradient", row_gradient),
    Program::new("diagonal_gradient", diagonal_gradient),
];

pub fn radial_gradient() -> Box<dyn Routine> {
    Box::new(RadialGradient::new())
}

pub fn row_gradient() -> Box<dyn Routine> {
    Box::new(LinearGradient::new(Axis::Rows))
}

pub fn diagonal_gradient() -> Box<dyn Routine> {
    Box::new(LinearGradient::new(Axis::Diagonal))
}

pub fn banner() -> Box<dyn Routine> {
    Box::new(Banner::new(BANNER_TEXT))
}

// ---------------------------------------------------------------------------
// Frame loop shared by the pattern programs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Phase {
    Render,
    Sleeping(Sleep),
}

/// Milliseconds since the previous frame; zero on the first one.
fn frame_delta(last: &mut Option<Millis>, now: Millis) -> Millis {
    let delta = last.map_or(0, |last| now.saturating_sub(last));
    *last = Some(now);
    delta
}

/// Show `image`, send it if broadcasting, and start the frame sleep.
fn present(io: &mut Io<'_>, image: &Image) -> Sleep {
    io.show(image);
    if let Err(err) = io.broadcast(image) {
        warn!("frame not sent: {}", err);
    }
    // A zero period would let the render loop spin inside one resume
    let period = Millis::from(io.config().pattern_period_ms.max(1));
    Sleep::start(io, period)
}

// ---------------------------------------------------------------------------
// Radial gradient
// ---------------------------------------------------------------------------

/// Rings of brightness moving outwards from the centre pixel.
#[derive(Debug)]
pub struct RadialGradient {
    /// Progress through the current cycle, in ms.
    offset: Millis,
    last: Option<Millis>,
    phase: Phase,
}

impl RadialGradient {
    pub fn new() -> Self {
        Self {
            offset: 0,
            last: None,
            phase: Phase::Render,
        }
    }

    fn render(&self) -> Image {
        let mut image = Image::blank();
        for (y, row) in RADIAL_DISTANCE.iter().enumerate() {
            for (x, &distance) in row.iter().enumerate() {
                let phase = (distance + self.offset) % RADIAL_CYCLE_MS;
                let index = (phase * SINE_TABLE.len() as u64 / RADIAL_CYCLE_MS) as usize;
                image.set_pixel(x, y, SINE_TABLE[index]);
            }
        }
        image
    }
}

impl Default for RadialGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for RadialGradient {
    fn resume(&mut self, io: &mut Io<'_>) -> Resume {
        loop {
            match &mut self.phase {
                Phase::Sleeping(sleep) => {
                    crate::suspend!(sleep.poll(io));
                    self.phase = Phase::Render;
                }
                Phase::Render => {
                    let delta = frame_delta(&mut self.last, io.now());
                    self.offset = (self.offset + delta) % RADIAL_CYCLE_MS;
                    let image = self.render();
                    self.phase = Phase::Sleeping(present(io, &image));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Linear gradients
// ---------------------------------------------------------------------------

/// Direction the stripes of a [`LinearGradient`] travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// One stripe per row.
    Rows,
    /// Stripes along `x + y`.
    Diagonal,
}

impl Axis {
    fn position(self, x: usize, y: usize) -> u64 {
        match self {
            Axis::Rows => y as u64,
            Axis::Diagonal => (x + y) as u64,
        }
    }
}

/// Brightness stripes sweeping along an [`Axis`].
#[derive(Debug)]
pub struct LinearGradient {
    axis: Axis,
    offset: Millis,
    last: Option<Millis>,
    phase: Phase,
}

impl LinearGradient {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            offset: 0,
            last: None,
            phase: Phase::Render,
        }
    }

    fn render(&self) -> Image {
        let mut image = Image::blank();
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                let step = self.offset + self.axis.position(x, y) * STRIPE_STEP_MS;
                let ramp = step % STRIPE_CYCLE_MS;
                // Scale 0..cycle onto 0..=9, rounding to nearest
                let value = (ramp * 9 + STRIPE_CYCLE_MS / 2) / STRIPE_CYCLE_MS;
                image.set_pixel(x, y, value as u8);
            }
        }
        image
    }
}

impl Routine for LinearGradient {
    fn resume(&mut self, io: &mut Io<'_>) -> Resume {
        loop {
            match &mut self.phase {
                Phase::Sleeping(sleep) => {
                    crate::suspend!(sleep.poll(io));
                    self.phase = Phase::Render;
                }
                Phase::Render => {
                    let delta = frame_delta(&mut self.last, io.now());
                    self.offset = (self.offset + delta) % STRIPE_CYCLE_MS;
                    let image = self.render();
                    self.phase = Phase::Sleeping(present(io, &image));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum BannerState {
    Scroll,
    Hold(Sleep),
}

/// Scrolls its text once, holds briefly, then completes.
#[derive(Debug)]
pub struct Banner {
    text: &'static str,
    state: BannerState,
}

impl Banner {
    pub fn new(text: &'static str) -> Self {
        Self {
            text,
            state: BannerState::Scroll,
        }
    }
}

impl Routine for Banner {
    fn resume(&mut self, io: &mut Io<'_>) -> Resume {
        if let BannerState::Scroll = self.state {
            io.scroll(self.text, true);
            self.state = BannerState::Hold(Sleep::start(io, BANNER_HOLD_MS));
        }
        if let BannerState::Hold(sleep) = &mut self.state {
            crate::suspend!(sleep.poll(io));
        }
        Resume::Completed
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
