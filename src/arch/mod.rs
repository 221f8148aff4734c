//! # Architecture Layer
//!
//! Everything that touches real hardware. `cortex_m4` owns the SysTick
//! time base; `microbit` turns the board's GPIO and display into a
//! [`Board`](crate::device::Board).

pub mod cortex_m4;
pub mod microbit;
