//! # TickOS: a Cooperative Program Shell
//!
//! A single-threaded cooperative scheduler for the micro:bit v2. Several
//! independently written "programs" take turns driving the 5×5 LED
//! display; the two buttons abort the running one and hand control to
//! a handler, usually "switch to the next program".
//!
//! ## Overview
//!
//! There is no preemption. A program is a resumable state machine
//! ([`task::Routine`]) whose only suspension point is a [`sleep::Sleep`].
//! Every time a sleep is polled it first looks at the buttons; a press
//! ends the program on the spot with `Resume::Failed(event)` and the
//! runtime routes the event to its handler before resuming anything
//! else.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │        Programs (programs.rs) · radial / row / diag    │
//! ├────────────────────────────────────────────────────────┤
//! │          Kernel API (kernel.rs)                        │
//! │     build_runtime() · default_handlers() · start()     │
//! ├──────────────┬──────────────────┬──────────────────────┤
//! │  Runtime     │  Registry        │  Handlers            │
//! │  scheduler.rs│  registry.rs     │  handlers.rs         │
//! │  ─ tick()    │  ─ register()    │  ─ next_program      │
//! │  ─ run()     │  ─ advance_and_  │  ─ restart_program   │
//! │              │    start()       │                      │
//! ├──────────────┴──────────────────┴──────────────────────┤
//! │   Task model (task.rs) · Sleep (sleep.rs)              │
//! │   Routine · Resume · TaskState · suspend!              │
//! ├────────────────────────────────────────────────────────┤
//! │   Device capabilities (device.rs, input.rs, time.rs)   │
//! │   Board · Display · Radio · Buttons · Clock · Io       │
//! ├────────────────────────────────────────────────────────┤
//! │   Arch port (arch/, sync.rs), target only              │
//! │   SysTick clock · microbit-v2 buttons, display, radio  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`event_loop`] module is a separate, smaller scheduler: many
//! `async` tasks in round-robin plus timed callbacks. It shares only the
//! [`time::Clock`] with the shell.
//!
//! ## Memory Model
//!
//! - Fixed-capacity program registry (`heapless::Vec`)
//! - One boxed task alive at a time; the firmware supplies a small heap
//! - Interrupt-shared counters behind `cortex_m::interrupt::Mutex`
//!
//! ## Logging
//!
//! Log macros forward to `defmt` with the `defmt` feature and compile to
//! nothing without it, so host tests need no logger.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Must come first: defines the log macros used by every other module.
mod fmt;

pub mod config;
pub mod device;
pub mod error;
pub mod event_loop;
pub mod handlers;
pub mod input;
pub mod kernel;
pub mod programs;
pub mod registry;
pub mod scheduler;
pub mod sleep;
pub mod task;
pub mod time;

#[cfg(target_os = "none")]
pub mod arch;
#[cfg(target_os = "none")]
pub mod sync;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use input::InputEvent;
pub use registry::Program;
pub use scheduler::{Runtime, RuntimeStats, TickOutcome};
pub use task::{Resume, Routine};
