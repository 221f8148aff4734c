//! # TickOS Firmware
//!
//! micro:bit v2 image. Cycles through the default pattern programs:
//!
//! | Program | Pattern |
//! |---------|---------|
//! | `radial_gradient` | Rings moving out from the centre, one cycle per second |
//! | `row_gradient` | Stripes travelling down the rows |
//! | `diagonal_gradient` | Stripes travelling along the diagonal |
//!
//! Button A switches to the next program, button B restarts the current
//! one. Logs go out over RTT; run with `cargo run --release --features
//! firmware` and a probe attached.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt_rtt as _;
use embedded_alloc::LlffHeap as Heap;
use panic_halt as _;

use tickos::arch::cortex_m4::SysTickClock;
use tickos::config::Config;
use tickos::kernel;
use tickos::time::Clock;

/// Heap for program tasks. Only one task is alive at a time.
const HEAP_SIZE: usize = 8 * 1024;

#[global_allocator]
static HEAP: Heap = Heap::empty();

defmt::timestamp!("{=u64:ms}", SysTickClock.now());

#[entry]
fn main() -> ! {
    {
        use core::mem::MaybeUninit;
        static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
        // SAFETY: called once, before the first allocation.
        unsafe { HEAP.init(core::ptr::addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }
    }

    defmt::info!("tickos booting");
    kernel::start(Config::default())
}
