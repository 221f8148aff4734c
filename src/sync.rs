//! # Interrupt-Shared State
//!
//! The interrupt handlers and the runtime loop share a handful of small
//! counters (the millisecond clock, button press counts). They live in
//! [`IrqCell`]s and are only touched inside a critical section.
//!
//! Peripherals an interrupt handler drives (the GPIOTE block, the LED
//! matrix timer) are moved into an [`IrqSlot`] once at startup.
//!
//! Target-only: interrupt masking has no host equivalent.

use core::cell::{Cell, RefCell};

use cortex_m::interrupt::{self, Mutex};

/// Execute a closure with interrupts disabled.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}

/// A `Copy` value shared between thread mode and interrupt handlers.
pub struct IrqCell<T: Copy> {
    inner: Mutex<Cell<T>>,
}

impl<T: Copy> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        critical_section(|cs| self.inner.borrow(cs).get())
    }

    /// Store `value` and return the previous one, atomically.
    #[inline]
    pub fn replace(&self, value: T) -> T {
        critical_section(|cs| self.inner.borrow(cs).replace(value))
    }

    /// Apply `f` atomically and return the new value.
    #[inline]
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(T) -> T,
    {
        critical_section(|cs| {
            let cell = self.inner.borrow(cs);
            let value = f(cell.get());
            cell.set(value);
            value
        })
    }
}

/// A peripheral handed over to interrupt context. Empty until [`put`].
///
/// [`put`]: IrqSlot::put
pub struct IrqSlot<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> IrqSlot<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Fill the slot, dropping whatever it held.
    pub fn put(&self, value: T) {
        critical_section(|cs| {
            self.inner.borrow(cs).replace(Some(value));
        })
    }

    /// Run `f` on the contents with interrupts disabled.
    ///
    /// # Returns
    /// `None` if the slot is still empty.
    pub fn with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section(|cs| self.inner.borrow(cs).borrow_mut().as_mut().map(f))
    }
}
