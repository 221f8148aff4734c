//! # micro:bit v2 Board Support
//!
//! Binds the shell's device traits to the `microbit-v2` board crate.
//!
//! ```text
//! microbit::Board::take()
//!   ├─► SYST            → SysTick millisecond clock (cortex_m4.rs)
//!   ├─► GPIOTE + buttons → falling-edge events, counted in GPIOTE()
//!   ├─► TIMER1 + display_pins → non-blocking matrix, refreshed in TIMER1()
//!   └─► CLOCK + RADIO   → HFXO, IEEE 802.15.4 radio
//! ```
//!
//! Brightness uses the full `0..=9` range of the board crate's greyscale
//! display. There is no font: scrolled text goes to the log and the
//! matrix stays blank for as long as the text would take to pass.

use microbit::board::Buttons as ButtonPins;
use microbit::display::nonblocking::{Display as LedMatrix, GreyscaleImage};
use microbit::hal::clocks::{Clocks, ExternalOscillator, Internal, LfOscStopped};
use microbit::hal::gpiote::Gpiote;
use microbit::hal::ieee802154::{self, Channel, Packet, TxPower};
use microbit::pac::{self, interrupt};

use crate::arch::cortex_m4::{self, SysTickClock};
use crate::config::RadioConfig;
use crate::device::{Board, Display, Image, Radio};
use crate::input::Buttons;
use crate::sync::{IrqCell, IrqSlot};
use crate::time::{Clock, Millis};

/// Time one character takes to scroll past: six columns at 150 ms.
const SCROLL_CHAR_MS: Millis = 900;

/// Largest payload an 802.15.4 frame carries (127-byte PSDU less the CRC).
const PACKET_CAPACITY: usize = 125;

type HfClocks = Clocks<ExternalOscillator, Internal, LfOscStopped>;

// ---------------------------------------------------------------------------
// Interrupt-side state
// ---------------------------------------------------------------------------

static A_PRESSES: IrqCell<u32> = IrqCell::new(0);
static B_PRESSES: IrqCell<u32> = IrqCell::new(0);

static BUTTON_EVENTS: IrqSlot<Gpiote> = IrqSlot::new();
static MATRIX: IrqSlot<LedMatrix<pac::TIMER1>> = IrqSlot::new();

#[interrupt]
fn GPIOTE() {
    BUTTON_EVENTS.with(|gpiote| {
        if gpiote.channel0().is_event_triggered() {
            A_PRESSES.update(|n| n.wrapping_add(1));
        }
        if gpiote.channel1().is_event_triggered() {
            B_PRESSES.update(|n| n.wrapping_add(1));
        }
        gpiote.reset_events();
    });
}

#[interrupt]
fn TIMER1() {
    MATRIX.with(|matrix| matrix.handle_display_event());
}

/// Route both buttons' falling edges to GPIOTE channels 0 and 1.
fn init_buttons(gpiote: pac::GPIOTE, buttons: ButtonPins) {
    let gpiote = Gpiote::new(gpiote);
    let button_a = buttons.button_a.degrade();
    let button_b = buttons.button_b.degrade();
    gpiote
        .channel0()
        .input_pin(&button_a)
        .hi_to_lo()
        .enable_interrupt();
    gpiote
        .channel1()
        .input_pin(&button_b)
        .hi_to_lo()
        .enable_interrupt();
    gpiote.reset_events();
    BUTTON_EVENTS.put(gpiote);
}

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------

fn channel_for(config: &RadioConfig) -> Channel {
    match config.ieee802154_channel() {
        11 => Channel::_11,
        12 => Channel::_12,
        13 => Channel::_13,
        14 => Channel::_14,
        15 => Channel::_15,
        16 => Channel::_16,
        17 => Channel::_17,
        18 => Channel::_18,
        19 => Channel::_19,
        20 => Channel::_20,
        21 => Channel::_21,
        22 => Channel::_22,
        23 => Channel::_23,
        24 => Channel::_24,
        25 => Channel::_25,
        _ => Channel::_26,
    }
}

fn tx_power_for(config: &RadioConfig) -> TxPower {
    match config.tx_power_dbm() {
        i8::MIN..=-40 => TxPower::Neg40dBm,
        -39..=-20 => TxPower::Neg20dBm,
        -19..=-16 => TxPower::Neg16dBm,
        -15..=-12 => TxPower::Neg12dBm,
        -11..=-8 => TxPower::Neg8dBm,
        -7..=-4 => TxPower::Neg4dBm,
        -3..=0 => TxPower::_0dBm,
        _ => TxPower::Pos4dBm,
    }
}

/// The nRF52833 radio in IEEE 802.15.4 mode.
pub struct MicrobitRadio {
    radio: ieee802154::Radio<'static>,
    packet: Packet,
}

impl MicrobitRadio {
    pub fn new(radio: pac::RADIO, clocks: &'static HfClocks) -> Self {
        Self {
            radio: ieee802154::Radio::init(radio, clocks),
            packet: Packet::new(),
        }
    }
}

impl Radio for MicrobitRadio {
    fn configure(&mut self, config: &RadioConfig) {
        self.radio.set_channel(channel_for(config));
        self.radio.set_txpower(tx_power_for(config));
    }

    fn send(&mut self, frame: &[u8]) {
        if frame.len() > PACKET_CAPACITY {
            warn!(
                "frame of {} bytes does not fit a packet ({})",
                frame.len(),
                PACKET_CAPACITY
            );
            return;
        }
        self.packet.copy_from_slice(frame);
        if self.radio.try_send(&mut self.packet).is_err() {
            debug!("channel busy, frame dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

pub struct MicrobitBoard {
    clock: SysTickClock,
    frame: Image,
    radio: MicrobitRadio,
}

impl MicrobitBoard {
    /// Take the board and bring up every peripheral the shell uses.
    ///
    /// # Returns
    /// `None` if the board was already taken.
    pub fn take() -> Option<Self> {
        let mut board = microbit::Board::take()?;

        cortex_m4::set_systick_priority();
        cortex_m4::configure_systick(&mut board.SYST);

        init_buttons(board.GPIOTE, board.buttons);
        MATRIX.put(LedMatrix::new(board.TIMER1, board.display_pins));

        let clocks = cortex_m::singleton!(: HfClocks = Clocks::new(board.CLOCK).enable_ext_hfosc())?;
        let radio = MicrobitRadio::new(board.RADIO, clocks);

        // SAFETY: both handlers only touch state behind a critical section.
        unsafe {
            pac::NVIC::unmask(pac::Interrupt::GPIOTE);
            pac::NVIC::unmask(pac::Interrupt::TIMER1);
        }

        Some(Self {
            clock: SysTickClock,
            frame: Image::blank(),
            radio,
        })
    }

    fn present(&self) {
        let image = GreyscaleImage::new(self.frame.rows());
        MATRIX.with(|matrix| matrix.show(&image));
    }
}

impl Clock for MicrobitBoard {
    #[inline]
    fn now(&self) -> Millis {
        self.clock.now()
    }
}

impl Buttons for MicrobitBoard {
    fn button_a_presses(&mut self) -> u32 {
        A_PRESSES.replace(0)
    }

    fn button_b_presses(&mut self) -> u32 {
        B_PRESSES.replace(0)
    }
}

impl Display for MicrobitBoard {
    fn set_pixel(&mut self, x: usize, y: usize, brightness: u8) {
        self.frame.set_pixel(x, y, brightness);
        self.present();
    }

    fn show(&mut self, image: &Image) {
        self.frame = *image;
        self.present();
    }

    fn scroll(&mut self, text: &str, wait: bool) {
        info!("scroll: {}", text);
        self.frame = Image::blank();
        MATRIX.with(|matrix| matrix.clear());
        if !wait {
            return;
        }
        let until = self.now() + text.len() as Millis * SCROLL_CHAR_MS;
        while self.now() < until {
            cortex_m::asm::wfi();
        }
    }
}

impl Board for MicrobitBoard {
    fn radio(&mut self) -> Option<&mut dyn Radio> {
        Some(&mut self.radio)
    }
}
