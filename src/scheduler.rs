//! # Runtime Loop
//!
//! The top-level cooperative scheduler. One [`Runtime`] is built at
//! startup and lives for the whole process; it owns the board, the
//! program registry and the handler table.
//!
//! ## Tick
//!
//! Each call to [`Runtime::tick`]:
//! 1. **Select**: if no task is active, advance the registry and start
//!    the next program. An empty registry makes the tick idle.
//! 2. **Resume** the active task exactly once.
//! 3. **Dispatch** on the result:
//!    - `Suspended` → nothing to do
//!    - `Completed` → log, drop the task; the next tick selects anew
//!    - `Failed(event)` → log, drop the task, then run the event's
//!      handler (if any) synchronously
//!
//! Handlers and program switches only ever run here, between two
//! resumptions, never inside one. A task is the only writer of the
//! display while it is active, and at most one task is active.

use crate::config::Config;
use crate::device::{Board, Io};
use crate::error::Result;
use crate::handlers::HandlerTable;
use crate::input::InputEvent;
use crate::registry::{Program, ProgramRegistry};
use crate::task::Resume;

// ---------------------------------------------------------------------------
// Tick outcome and statistics
// ---------------------------------------------------------------------------

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// No programs registered; nothing ran.
    Idle,
    /// The active task stopped at a suspension point.
    Suspended,
    /// The active task finished and was dropped.
    Completed,
    /// The active task was aborted by `event`. `handled` tells whether a
    /// handler ran.
    Dispatched { event: InputEvent, handled: bool },
}

/// Counters kept by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Program sessions started, by selection or by a handler.
    pub programs_started: u32,
    /// Tasks that ran to completion.
    pub completions: u32,
    /// Input events that aborted a task.
    pub events: u32,
    /// Events that found a handler.
    pub handled_events: u32,
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

pub struct Runtime<B: Board> {
    board: B,
    config: Config,
    registry: ProgramRegistry,
    handlers: HandlerTable,
    stats: RuntimeStats,
}

impl<B: Board> Runtime<B> {
    /// Build the runtime with the default handlers and apply the radio
    /// settings, if the board has a radio.
    pub fn new(mut board: B, config: Config) -> Self {
        if let Some(radio) = board.radio() {
            radio.configure(&config.radio);
            info!(
                "radio on channel {} power {}",
                config.radio.channel, config.radio.power
            );
        }
        Self {
            board,
            config,
            registry: ProgramRegistry::new(),
            handlers: HandlerTable::default(),
            stats: RuntimeStats::default(),
        }
    }

    /// Replace the handler table.
    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    /// Register a program. Legal at any time; a program added while
    /// another runs is picked up by a later selection.
    pub fn register(&mut self, program: Program) -> Result<usize> {
        self.registry.register(program)
    }

    /// Read-only view of the registry: active task, cursor, programs.
    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// Mutable access to the registry.
    ///
    /// Changes made here take effect on the next tick, the same way a
    /// handler's would.
    pub fn registry_mut(&mut self) -> &mut ProgramRegistry {
        &mut self.registry
    }

    /// Mutable access to the handler table.
    ///
    /// # Returns
    /// The table consulted by the next dispatch. Use
    /// [`HandlerTable::set`] / [`HandlerTable::clear`] to rewire events
    /// while the runtime is live.
    pub fn handlers_mut(&mut self) -> &mut HandlerTable {
        &mut self.handlers
    }

    #[inline]
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Mutable access to the board, between ticks.
    ///
    /// # Returns
    /// The board the runtime resumes tasks on. Tasks never see it
    /// directly; they get an [`Io`] built from it for one resumption.
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the runtime counters.
    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Run one scheduler iteration. See the module docs.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        if self.registry.active().is_none() {
            if self.registry.advance_and_start().is_err() {
                return TickOutcome::Idle;
            }
            self.stats.programs_started += 1;
        }

        let Some(task) = self.registry.active_mut() else {
            return TickOutcome::Idle;
        };
        let program = task.program();
        let mut io = Io::new(&mut self.board, &self.config);
        let result = task.resume(&mut io);

        match result {
            Resume::Suspended => TickOutcome::Suspended,
            Resume::Completed => {
                info!("{} stopped", program);
                self.registry.take_active();
                self.stats.completions += 1;
                TickOutcome::Completed
            }
            Resume::Failed(event) => {
                let handled = self.dispatch(event);
                TickOutcome::Dispatched { event, handled }
            }
        }
    }

    /// Drop the aborted task and run the handler for `event`.
    fn dispatch(&mut self, event: InputEvent) -> bool {
        info!("input: {}", event);
        self.stats.events += 1;

        // The aborted task is gone before the handler can start another
        self.registry.take_active();

        let Some(handler) = self.handlers.get(event) else {
            debug!("no handler for {}, dropped", event.key());
            return false;
        };

        info!("executing handler for {}", event.key());
        handler(&mut self.registry, event);
        self.stats.handled_events += 1;
        if self.registry.active().is_some() {
            self.stats.programs_started += 1;
        }
        true
    }

    /// Tick forever. The device never exits.
    pub fn run(&mut self) -> ! {
        info!("runtime started with {} programs", self.registry.len());
        loop {
            self.tick();
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
