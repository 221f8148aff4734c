//! # Program Registry
//!
//! The ordered list of programs the shell cycles through, the cursor of
//! the one selected last, and the slot holding its running [`Task`].
//!
//! ## Invariants
//!
//! - Programs keep registration order; the same factory registered
//!   twice occupies two independent slots.
//! - `active_index` starts at 0 and, with programs registered, stays in
//!   `[0, len)`. Every advance moves it one slot forward, so the first
//!   program started out of several is the one in slot 1.
//! - With no programs, nothing can become active and advancing is a
//!   no-op, logged once per stretch of emptiness.
//! - Programs registered mid-session only affect the *next*
//!   [`advance_and_start`](ProgramRegistry::advance_and_start).

use alloc::boxed::Box;
use core::fmt;

use crate::config::MAX_PROGRAMS;
use crate::error::{Error, Result};
use crate::task::{Routine, Task};

/// Builds a fresh routine every time the program is selected.
pub type ProgramFactory = fn() -> Box<dyn Routine>;

/// A named, immutable program factory.
#[derive(Clone, Copy)]
pub struct Program {
    name: &'static str,
    factory: ProgramFactory,
}

impl Program {
    pub const fn new(name: &'static str, factory: ProgramFactory) -> Self {
        Self { name, factory }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Instantiate a new session of this program.
    pub fn spawn(&self) -> Task {
        Task::new(self.name, (self.factory)())
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Program").field(&self.name).finish()
    }
}

pub struct ProgramRegistry {
    programs: heapless::Vec<Program, MAX_PROGRAMS>,
    /// Slot selected by the last advance.
    active_index: usize,
    active: Option<Task>,
    /// Set once the empty registry has been reported.
    empty_reported: bool,
}

impl ProgramRegistry {
    pub const fn new() -> Self {
        Self {
            programs: heapless::Vec::new(),
            active_index: 0,
            active: None,
            empty_reported: false,
        }
    }

    /// Append a program. Returns its slot index.
    pub fn register(&mut self, program: Program) -> Result<usize> {
        let slot = self.programs.len();
        self.programs
            .push(program)
            .map_err(|_| Error::RegistryFull {
                capacity: MAX_PROGRAMS,
            })?;
        self.empty_reported = false;
        debug!("registered program {} in slot {}", program.name, slot);
        Ok(slot)
    }

    /// Move the cursor to the next slot (wrapping) and make a fresh task
    /// of that program the active one.
    ///
    /// With no programs registered this leaves `active` unset and returns
    /// [`Error::RegistryEmpty`]. The first such call after the registry
    /// became empty logs a warning; the rest are silent.
    pub fn advance_and_start(&mut self) -> Result<&mut Task> {
        let len = self.programs.len();
        if len == 0 {
            if !self.empty_reported {
                warn!("no programs available");
                self.empty_reported = true;
            }
            self.active = None;
            return Err(Error::RegistryEmpty);
        }

        let index = (self.active_index + 1) % len;
        self.active_index = index;

        let program = self.programs[index];
        info!("starting program {} (slot {})", program.name, index);
        let task = self.active.insert(program.spawn());
        debug!("started {}", program.name);
        Ok(task)
    }

    /// The running task, if any.
    #[inline]
    pub fn active(&self) -> Option<&Task> {
        self.active.as_ref()
    }

    #[inline]
    pub fn active_mut(&mut self) -> Option<&mut Task> {
        self.active.as_mut()
    }

    /// Remove the running task from its slot.
    #[inline]
    pub fn take_active(&mut self) -> Option<Task> {
        self.active.take()
    }

    /// Put `task` in the active slot without moving the cursor. Returns
    /// the task it displaced.
    pub fn replace_active(&mut self, task: Task) -> Option<Task> {
        self.active.replace(task)
    }

    /// Slot selected by the most recent advance; 0 before the first one.
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn program(&self, index: usize) -> Option<&Program> {
        self.programs.get(index)
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProgramRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramRegistry")
            .field("active", &self.active)
            .field("active_index", &self.active_index)
            .field("programs", &self.programs.as_slice())
            .field("empty_reported", &self.empty_reported)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
