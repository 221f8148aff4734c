//! # Input Handlers
//!
//! At most one handler per [`InputEvent`] kind. A missing handler is
//! legal: the event is dropped. Handlers run synchronously on the
//! runtime loop, between two task resumptions, and must not suspend.

use core::fmt;

use crate::input::InputEvent;
use crate::registry::ProgramRegistry;

/// Reacts to an input event. Gets the registry so it can switch programs.
pub type Handler = fn(&mut ProgramRegistry, InputEvent);

/// Switch to the next program. The default ButtonA handler.
pub fn next_program(registry: &mut ProgramRegistry, _event: InputEvent) {
    // An empty registry is already logged by the registry itself
    let _ = registry.advance_and_start();
}

/// Restart the program in the current slot from scratch. On an empty
/// registry this falls back to [`next_program`].
pub fn restart_program(registry: &mut ProgramRegistry, event: InputEvent) {
    let Some(program) = registry.program(registry.active_index()).copied() else {
        next_program(registry, event);
        return;
    };
    info!("restarting program {}", program.name());
    registry.replace_active(program.spawn());
}

#[derive(Clone, Copy)]
pub struct HandlerTable {
    slots: [Option<Handler>; InputEvent::ALL.len()],
}

impl HandlerTable {
    /// A table with no handlers: every event is dropped.
    pub const fn empty() -> Self {
        Self {
            slots: [None; InputEvent::ALL.len()],
        }
    }

    /// Install `handler` for `event`, replacing any previous one.
    ///
    /// # Parameters
    /// - `event`: Event kind the handler reacts to
    /// - `handler`: Function run when a task is aborted by `event`
    ///
    /// # Returns
    /// The table, for chaining.
    pub fn set(&mut self, event: InputEvent, handler: Handler) -> &mut Self {
        self.slots[event.index()] = Some(handler);
        self
    }

    /// Remove the handler for `event`. Later events of that kind are
    /// dropped after aborting the task.
    ///
    /// # Returns
    /// The table, for chaining.
    pub fn clear(&mut self, event: InputEvent) -> &mut Self {
        self.slots[event.index()] = None;
        self
    }

    #[inline]
    pub fn get(&self, event: InputEvent) -> Option<Handler> {
        self.slots[event.index()]
    }
}

impl Default for HandlerTable {
    /// ButtonA switches program; ButtonB and Interrupt are unset.
    fn default() -> Self {
        let mut table = Self::empty();
        table.set(InputEvent::ButtonA, next_program);
        table
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event in InputEvent::ALL {
            map.entry(&event.key(), &self.get(event).is_some());
        }
        map.finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
