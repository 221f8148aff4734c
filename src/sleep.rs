//! # Sleep: the Suspension Point
//!
//! [`Sleep`] is the only place a program gives control back to the
//! runtime. Each poll:
//!
//! 1. polls the buttons; a pending [`InputEvent`] ends the sleep with
//!    `Ready(Err(event))`, however much of the duration is left;
//! 2. otherwise checks the deadline: `Ready(Ok(()))` once
//!    `now - start >= duration`, else `Pending` (suspend exactly once).
//!
//! Granularity is one scheduler tick: the sleep can overshoot its
//! duration by up to one tick's wall time. A sleep never loops inside a
//! single poll.

use core::task::Poll;

use crate::device::Io;
use crate::input::InputEvent;
use crate::time::Millis;

/// Independent state for one call to sleep. Re-entrant: every program,
/// and every sleep within a program, owns its own `Sleep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sleep {
    start: Millis,
    duration: Millis,
}

impl Sleep {
    /// Begin sleeping for `duration` milliseconds from `start`.
    pub const fn new(start: Millis, duration: Millis) -> Self {
        Self { start, duration }
    }

    /// Begin sleeping for `duration` milliseconds from now.
    pub fn start(io: &Io<'_>, duration: Millis) -> Self {
        Self::new(io.now(), duration)
    }

    /// When the sleep ends if no input arrives.
    pub fn deadline(&self) -> Millis {
        self.start.saturating_add(self.duration)
    }

    /// Drive the sleep one step. See the module docs for the order of checks.
    pub fn poll(&mut self, io: &mut Io<'_>) -> Poll<Result<(), InputEvent>> {
        if let Some(event) = io.poll_input() {
            trace!("sleep aborted by {}", event);
            return Poll::Ready(Err(event));
        }
        if io.now().saturating_sub(self.start) >= self.duration {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    }
}

/// Turn the poll of a suspension point into an early return from
/// [`Routine::resume`](crate::task::Routine::resume): `Pending` returns
/// `Resume::Suspended`, an input event returns `Resume::Failed`, and a
/// finished sleep evaluates to `()`.
#[macro_export]
macro_rules! suspend {
    ($poll:expr) => {
        match $poll {
            ::core::task::Poll::Pending => return $crate::task::Resume::Suspended,
            ::core::task::Poll::Ready(Err(event)) => return $crate::task::Resume::Failed(event),
            ::core::task::Poll::Ready(Ok(())) => {}
        }
    };
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
