//! # Input Poller
//!
//! Turns the device's "presses since last read" counters into discrete
//! [`InputEvent`]s. Polling only ever happens at a task's suspension
//! point (inside [`Sleep::poll`](crate::sleep::Sleep::poll)), never
//! preemptively.

use core::fmt;

/// An out-of-band signal that aborts the active task.
///
/// Transient: built, dispatched and dropped within one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    ButtonA,
    ButtonB,
    /// Generic abort, raised by the board's interrupt line or by a
    /// routine that wants to hand control to the interrupt handler.
    Interrupt,
}

impl InputEvent {
    /// Every event kind, in handler-table order.
    pub const ALL: [InputEvent; 3] = [InputEvent::ButtonA, InputEvent::ButtonB, InputEvent::Interrupt];

    /// Slot of this kind in a [`HandlerTable`](crate::handlers::HandlerTable).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            InputEvent::ButtonA => 0,
            InputEvent::ButtonB => 1,
            InputEvent::Interrupt => 2,
        }
    }

    /// Handler-lookup key, used in log lines.
    pub const fn key(self) -> &'static str {
        match self {
            InputEvent::ButtonA => "button_a",
            InputEvent::ButtonB => "button_b",
            InputEvent::Interrupt => "interrupt",
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The two physical buttons, plus an optional interrupt line.
///
/// Each read consumes the count: a second call without new presses
/// returns zero.
pub trait Buttons {
    fn button_a_presses(&mut self) -> u32;

    fn button_b_presses(&mut self) -> u32;

    /// Whether an interrupt was requested since the last read.
    fn interrupt_requested(&mut self) -> bool {
        false
    }
}

/// Samples [`Buttons`] and reports at most one event per poll.
pub struct InputPoller;

impl InputPoller {
    /// Read every counter once and report the highest-ranked pending
    /// event. ButtonA outranks ButtonB, which outranks Interrupt; the
    /// lower-ranked counts read on the same poll are consumed.
    pub fn poll<B: Buttons + ?Sized>(buttons: &mut B) -> Option<InputEvent> {
        let button_a = buttons.button_a_presses();
        let button_b = buttons.button_b_presses();
        let interrupt = buttons.interrupt_requested();

        if button_a > 0 {
            Some(InputEvent::ButtonA)
        } else if button_b > 0 {
            Some(InputEvent::ButtonB)
        } else if interrupt {
            Some(InputEvent::Interrupt)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBoard;

    #[test]
    fn test_no_presses_no_event() {
        let mut board = MockBoard::new(0);
        assert_eq!(InputPoller::poll(&mut board), None);
    }

    #[test]
    fn test_button_a_wins_and_b_is_consumed() {
        let mut board = MockBoard::new(0);
        board.press_a(1);
        board.press_b(2);
        assert_eq!(InputPoller::poll(&mut board), Some(InputEvent::ButtonA));
        // B's presses were read on the same poll
        assert_eq!(InputPoller::poll(&mut board), None);
    }

    #[test]
    fn test_button_b_then_interrupt() {
        let mut board = MockBoard::new(0);
        board.press_b(1);
        board.raise_interrupt();
        assert_eq!(InputPoller::poll(&mut board), Some(InputEvent::ButtonB));
        assert_eq!(InputPoller::poll(&mut board), None);

        board.raise_interrupt();
        assert_eq!(InputPoller::poll(&mut board), Some(InputEvent::Interrupt));
    }

    #[test]
    fn test_indices_cover_table() {
        for (slot, event) in InputEvent::ALL.iter().enumerate() {
            assert_eq!(event.index(), slot);
        }
        assert_eq!(InputEvent::ButtonB.key(), "button_b");
    }
}
