//! # Cooperative Task
//!
//! A [`Task`] is one run of a registered program: a [`Routine`] (the
//! program's resumable state machine) plus its lifecycle state. The
//! runtime owns at most one task at a time and drives it with
//! [`Task::resume`], one suspension step per call.
//!
//! ## Lifecycle
//!
//! ```text
//!   ┌─────────┐  resume()  ┌─────────┐  Suspended  ┌───────────┐
//!   │ Created │ ─────────► │ Running │ ──────────► │ Suspended │
//!   └─────────┘            └─────────┘ ◄────────── └───────────┘
//!                            │     │     resume()
//!                 Completed  │     │  Failed(event)
//!                            ▼     ▼
//!                  ┌───────────┐ ┌─────────┐
//!                  │ Completed │ │ Aborted │
//!                  └───────────┘ └─────────┘
//! ```
//!
//! A finished task is never resumed again; the runtime drops it.

use alloc::boxed::Box;
use core::fmt;

use crate::device::Io;
use crate::input::InputEvent;

// ---------------------------------------------------------------------------
// Resume result
// ---------------------------------------------------------------------------

/// Outcome of driving a task one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resume {
    /// Stopped at a suspension point; resume again later.
    Suspended,
    /// Ran to the end. The runtime drops it and rotates to the next program.
    Completed,
    /// Aborted by an input event that must be routed to its handler.
    Failed(InputEvent),
}

// ---------------------------------------------------------------------------
// Routine
// ---------------------------------------------------------------------------

/// A resumable computation.
///
/// Each call must run up to the next suspension point and no further:
/// return `Suspended` where the program would wait, `Completed` when it
/// is done, or `Failed(event)` to abort. Input is only observed through
/// [`Sleep`](crate::sleep::Sleep), so a routine that never sleeps can
/// never be interrupted.
pub trait Routine {
    fn resume(&mut self, io: &mut Io<'_>) -> Resume;
}

impl<F> Routine for F
where
    F: FnMut(&mut Io<'_>) -> Resume,
{
    fn resume(&mut self, io: &mut Io<'_>) -> Resume {
        self(io)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Built by the program factory, never resumed.
    Created,
    /// Inside a `resume` call.
    Running,
    /// Waiting at a suspension point.
    Suspended,
    /// Finished normally.
    Completed,
    /// Ended by an input event.
    Aborted,
}

impl TaskState {
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Aborted)
    }
}

/// One session of a program. Owned exclusively by the registry's active
/// slot; discarded on completion or abort.
pub struct Task {
    program: &'static str,
    state: TaskState,
    resumes: u32,
    routine: Box<dyn Routine>,
}

impl Task {
    pub fn new(program: &'static str, routine: Box<dyn Routine>) -> Self {
        Self {
            program,
            state: TaskState::Created,
            resumes: 0,
            routine,
        }
    }

    /// Name of the program this task runs.
    #[inline]
    pub fn program(&self) -> &'static str {
        self.program
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Number of times the routine has been driven.
    #[inline]
    pub fn resumes(&self) -> u32 {
        self.resumes
    }

    /// Drive the routine one suspension step.
    ///
    /// A task that already finished reports `Completed` without running
    /// its routine again.
    pub fn resume(&mut self, io: &mut Io<'_>) -> Resume {
        if self.state.is_finished() {
            return Resume::Completed;
        }

        self.state = TaskState::Running;
        self.resumes = self.resumes.wrapping_add(1);
        let result = self.routine.resume(io);

        self.state = match result {
            Resume::Suspended => TaskState::Suspended,
            Resume::Completed => TaskState::Completed,
            Resume::Failed(_) => TaskState::Aborted,
        };
        result
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("program", &self.program)
            .field("state", &self.state)
            .field("resumes", &self.resumes)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sleep::Sleep;
    use crate::testing::MockBoard;

    fn step(task: &mut Task, board: &mut MockBoard) -> Resume {
        let config = Config::default();
        let mut io = Io::new(board, &config);
        task.resume(&mut io)
    }

    /// Sleeps `period` ms `rounds` times, then completes.
    struct Napper {
        rounds: u32,
        sleep: Option<Sleep>,
    }

    impl Routine for Napper {
        fn resume(&mut self, io: &mut Io<'_>) -> Resume {
            loop {
                match self.sleep.as_mut() {
                    Some(sleep) => {
                        crate::suspend!(sleep.poll(io));
                        self.sleep = None;
                        self.rounds -= 1;
                    }
                    None if self.rounds == 0 => return Resume::Completed,
                    None => self.sleep = Some(Sleep::start(io, 10)),
                }
            }
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut board = MockBoard::new(0);
        let mut task = Task::new(
            "napper",
            Box::new(Napper {
                rounds: 2,
                sleep: None,
            }),
        );
        assert_eq!(task.state(), TaskState::Created);

        assert_eq!(step(&mut task, &mut board), Resume::Suspended);
        assert_eq!(task.state(), TaskState::Suspended);

        board.set_time(10);
        assert_eq!(step(&mut task, &mut board), Resume::Suspended);
        board.set_time(20);
        assert_eq!(step(&mut task, &mut board), Resume::Completed);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.resumes(), 3);
    }

    #[test]
    fn test_finished_task_is_not_driven_again() {
        let mut board = MockBoard::new(0);
        let mut calls = 0u32;
        let mut task = Task::new(
            "once",
            Box::new(move |_: &mut Io<'_>| {
                calls += 1;
                assert_eq!(calls, 1, "routine resumed after finishing");
                Resume::Completed
            }),
        );
        assert_eq!(step(&mut task, &mut board), Resume::Completed);
        assert_eq!(step(&mut task, &mut board), Resume::Completed);
        assert_eq!(task.resumes(), 1);
    }

    #[test]
    fn test_input_aborts_task() {
        let mut board = MockBoard::new(0);
        let mut task = Task::new(
            "napper",
            Box::new(Napper {
                rounds: 5,
                sleep: None,
            }),
        );
        assert_eq!(step(&mut task, &mut board), Resume::Suspended);
        board.press_a(1);
        assert_eq!(
            step(&mut task, &mut board),
            Resume::Failed(InputEvent::ButtonA)
        );
        assert_eq!(task.state(), TaskState::Aborted);
        assert_eq!(step(&mut task, &mut board), Resume::Completed);
    }
}
