//! # Cortex-M4 Time Base
//!
//! SysTick fires at `TICK_HZ` and is the device's only clock source.
//! Each interrupt advances the millisecond counter; buttons and the LED
//! matrix have their own interrupts (see `microbit.rs`).
//!
//! ## Interrupt Priorities
//!
//! - SysTick: 0xFF (lowest). A late tick only stretches a sleep.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::sync::IrqCell;
use crate::time::{Clock, Millis};

/// Milliseconds since `configure_systick`.
static TICKS: IrqCell<Millis> = IrqCell::new(0);

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Start SysTick at `TICK_HZ` from the core clock, interrupt enabled.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Put SysTick at the lowest exception priority.
pub fn set_systick_priority() {
    // SHPR3 (0xE000_ED20), bits [31:24] = SysTick priority
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    unsafe {
        let val = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, val | (0xFF << 24));
    }
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

#[exception]
fn SysTick() {
    TICKS.update(|ticks| ticks.wrapping_add(1));
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// The SysTick millisecond counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysTickClock;

impl Clock for SysTickClock {
    #[inline]
    fn now(&self) -> Millis {
        TICKS.get()
    }
}
