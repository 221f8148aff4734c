//! # Timer Source
//!
//! The monotonic millisecond clock everything that sleeps depends on.

/// Milliseconds on the device clock.
pub type Millis = u64;

/// A monotonic, non-decreasing millisecond clock.
///
/// Reading it is infallible and has no side effects.
pub trait Clock {
    fn now(&self) -> Millis;

    /// Milliseconds elapsed since `since`. Saturates at zero if `since`
    /// lies in the future.
    #[inline]
    fn elapsed_since(&self, since: Millis) -> Millis {
        self.now().saturating_sub(since)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Millis {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for alloc::rc::Rc<C> {
    #[inline]
    fn now(&self) -> Millis {
        (**self).now()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
