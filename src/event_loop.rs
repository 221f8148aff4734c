//! # Event Loop
//!
//! A second, lower-level scheduler that runs many tasks at once, kept
//! apart from the button/program shell. Tasks are `async` blocks;
//! the only ways to wait are a [`Promise`] (for example the one
//! returned by [`Handle::sleep`]) and [`yield_now`].
//!
//! ## Iteration
//!
//! ```text
//!   ┌────────────────────────────────────────────────────────────┐
//!   │ 1. drain every DeferredCall with fire_at < now, then fire  │
//!   │    them in deadline order (each exactly once)              │
//!   │ 2. pop the front task; empty list → loop ends              │
//!   │ 3. poll it once; Pending → push to the back                │
//!   │                  Ready   → drop it                         │
//!   └────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no wakers to speak of: every live task is polled once per
//! pass through the list, so a task waiting on an unresolved promise
//! simply reports `Pending` again. The loop busy-waits between timer
//! deadlines.
//!
//! A call is due once its deadline is strictly in the past, so a call
//! scheduled for `now` waits for the clock to move on.
//!
//! [`Handle`]s hold the loop weakly. Tasks usually capture one, and a
//! strong reference would keep the loop and its tasks alive forever.
//! Once the [`EventLoop`] is dropped, handle operations do nothing.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::task::noop_waker_ref;

use crate::time::{Clock, Millis};

// ---------------------------------------------------------------------------
// Deferred calls
// ---------------------------------------------------------------------------

/// A callback scheduled to run once `fire_at` has passed.
pub struct DeferredCall {
    fire_at: Millis,
    callback: Box<dyn FnOnce()>,
}

impl DeferredCall {
    #[inline]
    pub fn fire_at(&self) -> Millis {
        self.fire_at
    }
}

impl fmt::Debug for DeferredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCall")
            .field("fire_at", &self.fire_at)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Promise
// ---------------------------------------------------------------------------

/// A value that will be supplied later through its [`Resolver`].
///
/// Awaiting it suspends the task until `resolve` has been called.
pub struct Promise<T> {
    slot: Rc<Cell<Option<T>>>,
}

/// The write end of a [`Promise`].
pub struct Resolver<T> {
    slot: Rc<Cell<Option<T>>>,
}

impl<T> Promise<T> {
    pub fn new() -> (Promise<T>, Resolver<T>) {
        let slot = Rc::new(Cell::new(None));
        (
            Promise { slot: slot.clone() },
            Resolver { slot },
        )
    }
}

impl<T> Resolver<T> {
    /// Supply the value. The awaiting task sees it on its next poll.
    pub fn resolve(self, value: T) {
        self.slot.set(Some(value));
    }
}

impl<T> Future for Promise<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        match self.slot.take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

/// Give up the rest of this turn; resume on the next pass.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

// ---------------------------------------------------------------------------
// Shared state and handle
// ---------------------------------------------------------------------------

type LazyTask = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()>>;

enum Entry {
    /// Not yet instantiated; built the first time it is popped.
    Lazy(LazyTask),
    Running(LocalBoxFuture<'static, ()>),
}

struct Shared {
    clock: Rc<dyn Clock>,
    pending: RefCell<Vec<DeferredCall>>,
    tasks: RefCell<VecDeque<Entry>>,
}

/// Cloneable access to a running [`EventLoop`], for use inside tasks
/// and callbacks.
#[derive(Clone)]
pub struct Handle {
    clock: Rc<dyn Clock>,
    shared: Weak<Shared>,
}

impl Handle {
    #[inline]
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Run `callback` on the first iteration after the clock passes
    /// `fire_at`.
    ///
    /// # Parameters
    /// - `fire_at`: Deadline on the loop's clock, in ms
    /// - `callback`: Runs exactly once, between two task polls
    ///
    /// The callback is dropped unrun if the loop is already gone.
    pub fn call_at<F>(&self, fire_at: Millis, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let Some(shared) = self.shared.upgrade() else {
            debug!("event loop gone, call at {} dropped", fire_at);
            return;
        };
        shared.pending.borrow_mut().push(DeferredCall {
            fire_at,
            callback: Box::new(callback),
        });
    }

    /// A promise that resolves to `true` after `duration` ms.
    pub fn sleep(&self, duration: Millis) -> Promise<bool> {
        let (promise, resolver) = Promise::new();
        let fire_at = self.now().saturating_add(duration);
        self.call_at(fire_at, move || resolver.resolve(true));
        promise
    }

    /// Append a task to the back of the run list.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.push(Entry::Running(future.boxed_local()));
    }

    /// Append a task that is only built from `factory` when first
    /// scheduled.
    pub fn spawn_lazy<F, Fut>(&self, factory: F)
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.push(Entry::Lazy(Box::new(move || factory().boxed_local())));
    }

    fn push(&self, entry: Entry) {
        match self.shared.upgrade() {
            Some(shared) => shared.tasks.borrow_mut().push_back(entry),
            None => debug!("event loop gone, task dropped"),
        }
    }

    /// Deferred calls not yet fired.
    pub fn pending_calls(&self) -> usize {
        self.shared
            .upgrade()
            .map_or(0, |shared| shared.pending.borrow().len())
    }

    /// Live tasks, excluding one that is currently being polled.
    pub fn task_count(&self) -> usize {
        self.shared
            .upgrade()
            .map_or(0, |shared| shared.tasks.borrow().len())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("tasks", &self.task_count())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// What one [`EventLoop::step`] did with the task it popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Turn {
    /// Task list empty; [`EventLoop::run`] stops here.
    Idle,
    /// Polled a task that is still running; it went to the back.
    Pending,
    /// Polled a task to completion and dropped it.
    Finished,
}

/// Totals accumulated over the life of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopReport {
    pub iterations: u64,
    pub deferred_fired: u64,
    pub tasks_finished: u64,
}

pub struct EventLoop {
    shared: Rc<Shared>,
    report: LoopReport,
}

impl EventLoop {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            shared: Rc::new(Shared {
                clock,
                pending: RefCell::new(Vec::new()),
                tasks: RefCell::new(VecDeque::new()),
            }),
            report: LoopReport::default(),
        }
    }

    pub fn handle(&self) -> Handle {
        Handle {
            clock: self.shared.clock.clone(),
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn report(&self) -> LoopReport {
        self.report
    }

    /// Fire every due deferred call. Returns how many fired.
    fn fire_due(&mut self) -> usize {
        let now = self.shared.clock.now();

        // Detach the due calls first: a callback may schedule more
        let mut due = {
            let mut pending = self.shared.pending.borrow_mut();
            let (due, rest): (Vec<DeferredCall>, Vec<DeferredCall>) = core::mem::take(&mut *pending)
                .into_iter()
                .partition(|call| call.fire_at < now);
            *pending = rest;
            due
        };
        due.sort_by_key(|call| call.fire_at);

        let fired = due.len();
        for call in due {
            trace!("deferred call due at {} fired at {}", call.fire_at, now);
            (call.callback)();
        }
        self.report.deferred_fired += fired as u64;
        fired
    }

    /// One iteration: fire due calls, then poll the front task once.
    pub fn step(&mut self) -> Turn {
        self.report.iterations += 1;
        self.fire_due();

        let Some(entry) = self.shared.tasks.borrow_mut().pop_front() else {
            return Turn::Idle;
        };
        let mut future = match entry {
            Entry::Lazy(factory) => factory(),
            Entry::Running(future) => future,
        };

        let mut cx = Context::from_waker(noop_waker_ref());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                self.report.tasks_finished += 1;
                Turn::Finished
            }
            Poll::Pending => {
                self.shared.tasks.borrow_mut().push_back(Entry::Running(future));
                Turn::Pending
            }
        }
    }

    /// Step until the task list is empty. Deferred calls still pending
    /// at that point never fire.
    pub fn run(&mut self) -> LoopReport {
        while self.step() != Turn::Idle {}
        let leftover = self.shared.pending.borrow().len();
        info!(
            "event loop done after {} iterations, {} calls left",
            self.report.iterations, leftover
        );
        self.report
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("handle", &self.handle())
            .field("report", &self.report)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClock;
    use futures_util::future::poll_fn;

    fn setup(now: Millis) -> (Rc<MockClock>, EventLoop) {
        let clock = Rc::new(MockClock::new(now));
        let event_loop = EventLoop::new(clock.clone());
        (clock, event_loop)
    }

    fn recorder() -> Rc<RefCell<Vec<Millis>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_due_calls_fire_once_in_deadline_order() {
        let (clock, mut event_loop) = setup(1_000);
        let handle = event_loop.handle();
        let fired = recorder();
        for offset in [300, 200, 700] {
            let fired = fired.clone();
            handle.call_at(1_000 + offset, move || fired.borrow_mut().push(offset));
        }

        assert_eq!(event_loop.step(), Turn::Idle);
        assert!(fired.borrow().is_empty());

        clock.set(1_301);
        event_loop.step();
        assert_eq!(*fired.borrow(), [200, 300]);
        assert_eq!(handle.pending_calls(), 1);

        event_loop.step();
        assert_eq!(*fired.borrow(), [200, 300], "call fired twice");

        // Deadline reached but not yet passed
        clock.set(1_700);
        event_loop.step();
        assert_eq!(*fired.borrow(), [200, 300]);

        clock.set(1_701);
        event_loop.step();
        assert_eq!(*fired.borrow(), [200, 300, 700]);
        assert_eq!(handle.pending_calls(), 0);
        assert_eq!(event_loop.report().deferred_fired, 3);
    }

    #[test]
    fn test_call_scheduled_by_callback_waits_a_turn() {
        let (_clock, mut event_loop) = setup(1);
        let handle = event_loop.handle();
        let fired = recorder();

        let inner = handle.clone();
        let log = fired.clone();
        handle.call_at(0, move || {
            log.borrow_mut().push(1);
            let log = log.clone();
            inner.call_at(0, move || log.borrow_mut().push(2));
        });

        event_loop.step();
        assert_eq!(*fired.borrow(), [1]);
        event_loop.step();
        assert_eq!(*fired.borrow(), [1, 2]);
    }

    #[test]
    fn test_round_robin_fairness() {
        let (_clock, mut event_loop) = setup(0);
        let handle = event_loop.handle();
        let polls: Rc<[Cell<u32>; 3]> = Rc::new(Default::default());
        for i in 0..3 {
            let polls = polls.clone();
            handle.spawn(poll_fn(move |_| {
                polls[i].set(polls[i].get() + 1);
                Poll::<()>::Pending
            }));
        }

        for round in 1..=4 {
            for _ in 0..3 {
                assert_eq!(event_loop.step(), Turn::Pending);
            }
            for (i, count) in polls.iter().enumerate() {
                assert_eq!(count.get(), round, "task {} after round {}", i, round);
            }
        }
    }

    #[test]
    fn test_sleep_resolves_with_true() {
        let (clock, mut event_loop) = setup(0);
        let handle = event_loop.handle();
        let result = Rc::new(Cell::new(None));

        let sleeper = handle.clone();
        let out = result.clone();
        handle.spawn(async move {
            out.set(Some(sleeper.sleep(50).await));
        });

        assert_eq!(event_loop.step(), Turn::Pending);
        clock.set(49);
        assert_eq!(event_loop.step(), Turn::Pending);
        assert_eq!(result.get(), None);

        clock.set(50);
        assert_eq!(event_loop.step(), Turn::Pending);
        assert_eq!(result.get(), None);

        clock.set(51);
        assert_eq!(event_loop.step(), Turn::Finished);
        assert_eq!(result.get(), Some(true));
        assert_eq!(event_loop.step(), Turn::Idle);
    }

    #[test]
    fn test_run_ends_with_calls_pending() {
        let (_clock, mut event_loop) = setup(0);
        let handle = event_loop.handle();
        handle.call_at(10_000, || panic!("fired after the loop ended"));
        handle.spawn(async {});

        let report = event_loop.run();
        assert_eq!(report.tasks_finished, 1);
        assert_eq!(report.iterations, 2);
        assert_eq!(handle.pending_calls(), 1);
    }

    #[test]
    fn test_lazy_task_built_when_popped() {
        let (_clock, mut event_loop) = setup(0);
        let handle = event_loop.handle();
        let built = Rc::new(Cell::new(false));

        handle.spawn(yield_now());
        let flag = built.clone();
        handle.spawn_lazy(move || {
            flag.set(true);
            async {}
        });

        assert_eq!(event_loop.step(), Turn::Pending);
        assert!(!built.get());
        assert_eq!(event_loop.step(), Turn::Finished);
        assert!(built.get());
        assert_eq!(event_loop.step(), Turn::Finished);
    }

    #[test]
    fn test_promise_resolved_by_another_task() {
        let (_clock, mut event_loop) = setup(0);
        let handle = event_loop.handle();
        let (promise, resolver) = Promise::new();
        let got = Rc::new(Cell::new(0u32));

        let out = got.clone();
        handle.spawn(async move { out.set(promise.await) });
        handle.spawn(async move {
            yield_now().await;
            resolver.resolve(7);
        });

        let report = event_loop.run();
        assert_eq!(got.get(), 7);
        assert_eq!(report.tasks_finished, 2);
    }

    #[test]
    fn test_dropping_loop_releases_tasks() {
        let (_clock, event_loop) = setup(0);
        let handle = event_loop.handle();
        let owned = Rc::new(());

        let held = owned.clone();
        let sleeper = handle.clone();
        handle.spawn(async move {
            let _held = held;
            sleeper.sleep(10).await;
        });
        assert_eq!(Rc::strong_count(&owned), 2);
        assert_eq!(handle.task_count(), 1);

        drop(event_loop);
        assert_eq!(Rc::strong_count(&owned), 1, "task outlived its loop");
        assert_eq!(handle.task_count(), 0);
        assert_eq!(handle.pending_calls(), 0);

        // Ignored rather than resurrecting the loop
        handle.spawn(async {});
        handle.call_at(0, || panic!("fired without a loop"));
        assert_eq!(handle.task_count(), 0);
    }

    #[test]
    fn test_sleepers_finish_in_deadline_order() {
        let clock = Rc::new(MockClock::ticking(0, 1));
        let mut event_loop = EventLoop::new(clock.clone());
        let handle = event_loop.handle();
        let order = recorder();

        for duration in [30, 10, 20] {
            let sleeper = handle.clone();
            let order = order.clone();
            handle.spawn(async move {
                sleeper.sleep(duration).await;
                order.borrow_mut().push(duration);
            });
        }

        let report = event_loop.run();
        assert_eq!(*order.borrow(), [10, 20, 30]);
        assert_eq!(report.deferred_fired, 3);
        assert_eq!(report.tasks_finished, 3);
    }
}
