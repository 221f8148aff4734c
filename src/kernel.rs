//! # Kernel
//!
//! Startup API: builds the single [`Runtime`] the device runs for its
//! whole life, with the default programs and handler wiring.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► heap init
//!         └─► kernel::start(config)     ← never returns
//!               ├─► MicrobitBoard::take()
//!               │     ├─► SysTick, GPIOTE buttons, TIMER1 display
//!               │     └─► HFXO + radio
//!               ├─► kernel::build_runtime()
//!               │     ├─► register DEFAULT_PROGRAMS
//!               │     └─► ButtonA → next_program, ButtonB → restart_program
//!               └─► Runtime::run()
//! ```

use crate::config::Config;
use crate::device::Board;
use crate::error::Result;
use crate::handlers::{next_program, restart_program, HandlerTable};
use crate::input::InputEvent;
use crate::programs::DEFAULT_PROGRAMS;
use crate::scheduler::Runtime;

/// The handler wiring used by the firmware.
pub fn default_handlers() -> HandlerTable {
    let mut handlers = HandlerTable::empty();
    handlers
        .set(InputEvent::ButtonA, next_program)
        .set(InputEvent::ButtonB, restart_program);
    handlers
}

/// Build a runtime on `board` with the default programs registered in
/// rotation order.
pub fn build_runtime<B: Board>(board: B, config: Config) -> Result<Runtime<B>> {
    let mut runtime = Runtime::new(board, config).with_handlers(default_handlers());
    for program in DEFAULT_PROGRAMS {
        runtime.register(program)?;
    }
    Ok(runtime)
}

/// Bring up the micro:bit and run the shell. **Does not return.**
///
/// Must be called once, from `main`, with the heap already initialized.
#[cfg(target_os = "none")]
pub fn start(config: Config) -> ! {
    use crate::arch::microbit::MicrobitBoard;

    let Some(board) = MicrobitBoard::take() else {
        error!("board peripherals already taken");
        loop {
            cortex_m::asm::wfi();
        }
    };

    match build_runtime(board, config) {
        Ok(mut runtime) => runtime.run(),
        Err(err) => {
            error!("startup failed: {}", err);
            loop {
                cortex_m::asm::wfi();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TickOutcome;
    use crate::testing::MockBoard;

    #[test]
    fn test_default_programs_registered_in_order() {
        let runtime = build_runtime(MockBoard::new(0), Config::default()).unwrap();
        let registry = runtime.registry();
        assert_eq!(registry.len(), DEFAULT_PROGRAMS.len());
        for (i, program) in DEFAULT_PROGRAMS.iter().enumerate() {
            assert_eq!(registry.program(i).map(|p| p.name()), Some(program.name()));
        }
        assert!(registry.active().is_none(), "nothing runs before the first tick");
    }

    #[test]
    fn test_firmware_wiring() {
        let handlers = default_handlers();
        assert!(handlers.get(InputEvent::ButtonA).is_some());
        assert!(handlers.get(InputEvent::ButtonB).is_some());
        assert!(handlers.get(InputEvent::Interrupt).is_none());
    }

    #[test]
    fn test_buttons_drive_default_runtime() {
        let mut runtime = build_runtime(MockBoard::new(0), Config::default()).unwrap();
        runtime.tick();
        assert_eq!(runtime.registry().active_index(), 1);

        runtime.board_mut().press_a(1);
        runtime.tick();
        assert_eq!(runtime.registry().active_index(), 2);

        runtime.board_mut().press_b(1);
        assert_eq!(
            runtime.tick(),
            TickOutcome::Dispatched {
                event: InputEvent::ButtonB,
                handled: true
            }
        );
        assert_eq!(runtime.registry().active_index(), 2);
    }
}
