//! # TickOS Configuration
//!
//! Compile-time constants governing the shell, plus the small runtime
//! [`Config`] that is validated once at startup and handed to every
//! program through [`Io::config`](crate::device::Io::config).

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Compile-time limits
// ---------------------------------------------------------------------------

/// Maximum number of programs the registry can hold.
/// Bounds the registry's inline storage; registration never allocates.
pub const MAX_PROGRAMS: usize = 8;

/// Display width in pixels.
pub const DISPLAY_WIDTH: usize = 5;

/// Display height in pixels.
pub const DISPLAY_HEIGHT: usize = 5;

/// Brightest value a pixel can take. `0` is off.
pub const BRIGHTNESS_MAX: u8 = 9;

/// SysTick frequency in Hz. One tick is one millisecond of the
/// device clock.
pub const TICK_HZ: u32 = 1000;

/// Core clock of the nRF52833 in Hz.
pub const SYSTEM_CLOCK_HZ: u32 = 64_000_000;

/// Largest payload the radio accepts in one frame, in bytes.
pub const MAX_RADIO_FRAME: usize = 251;

// ---------------------------------------------------------------------------
// Recognized ranges and defaults
// ---------------------------------------------------------------------------

/// Highest radio channel. Channels are 1 MHz apart starting at 2400 MHz.
pub const RADIO_CHANNEL_MAX: u8 = 83;

/// Highest radio power level.
pub const RADIO_POWER_MAX: u8 = 7;

pub const DEFAULT_RADIO_CHANNEL: u8 = 73;
pub const DEFAULT_RADIO_POWER: u8 = 7;

/// Delay between two frames of a pattern program, in milliseconds.
pub const DEFAULT_PATTERN_PERIOD_MS: u32 = 10;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Radio settings applied once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Channel, `0..=RADIO_CHANNEL_MAX`.
    pub channel: u8,
    /// Transmit power level, `0..=RADIO_POWER_MAX`.
    pub power: u8,
    /// Maximum frame length in bytes, `1..=MAX_RADIO_FRAME`.
    pub length: usize,
}

impl RadioConfig {
    /// Build a radio configuration, rejecting out-of-range values.
    pub fn new(channel: u8, power: u8, length: usize) -> Result<Self> {
        if channel > RADIO_CHANNEL_MAX {
            return Err(Error::ChannelOutOfRange(channel));
        }
        if power > RADIO_POWER_MAX {
            return Err(Error::PowerOutOfRange(power));
        }
        if length == 0 {
            return Err(Error::ZeroFrameLength);
        }
        if length > MAX_RADIO_FRAME {
            return Err(Error::FrameTooLong {
                len: length,
                max: MAX_RADIO_FRAME,
            });
        }
        Ok(Self {
            channel,
            power,
            length,
        })
    }

    /// The IEEE 802.15.4 channel (11..=26, 5 MHz apart from 2405 MHz)
    /// nearest to `channel` (1 MHz apart from 2400 MHz).
    pub fn ieee802154_channel(&self) -> u8 {
        let channel = self.channel.min(RADIO_CHANNEL_MAX);
        (11 + (channel.saturating_sub(5) + 2) / 5).min(26)
    }

    /// Transmit power in dBm for `power`, from -40 dBm at level 0 up
    /// to +4 dBm at `RADIO_POWER_MAX`.
    pub fn tx_power_dbm(&self) -> i8 {
        const LEVELS: [i8; RADIO_POWER_MAX as usize + 1] = [-40, -20, -16, -12, -8, -4, 0, 4];
        LEVELS[usize::from(self.power.min(RADIO_POWER_MAX))]
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_RADIO_CHANNEL,
            power: DEFAULT_RADIO_POWER,
            length: MAX_RADIO_FRAME,
        }
    }
}

/// Everything about the shell that is not a literal constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub radio: RadioConfig,
    /// Frame period for pattern programs. Never zero.
    pub pattern_period_ms: u32,
    /// Send rendered frames over the radio, if the board has one.
    pub broadcast: bool,
}

impl Config {
    pub fn new(radio: RadioConfig, pattern_period_ms: u32, broadcast: bool) -> Result<Self> {
        if pattern_period_ms == 0 {
            return Err(Error::ZeroPatternPeriod);
        }
        Ok(Self {
            radio,
            pattern_period_ms,
            broadcast,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radio: RadioConfig::default(),
            pattern_period_ms: DEFAULT_PATTERN_PERIOD_MS,
            broadcast: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = Config::default();
        assert_eq!(config.radio.channel, 73);
        assert_eq!(config.radio.power, 7);
        assert_eq!(config.radio.length, 251);
        assert_eq!(config.pattern_period_ms, 10);
        assert!(!config.broadcast);
    }

    #[test]
    fn test_radio_ranges() {
        assert!(RadioConfig::new(0, 0, 1).is_ok());
        assert!(RadioConfig::new(83, 7, 251).is_ok());
        assert_eq!(
            RadioConfig::new(84, 7, 32),
            Err(Error::ChannelOutOfRange(84))
        );
        assert_eq!(RadioConfig::new(10, 8, 32), Err(Error::PowerOutOfRange(8)));
        assert_eq!(
            RadioConfig::new(10, 3, 252),
            Err(Error::FrameTooLong { len: 252, max: 251 })
        );
    }

    #[test]
    fn test_ieee802154_mapping() {
        let channel = |c| RadioConfig::new(c, 0, 32).unwrap().ieee802154_channel();
        assert_eq!(channel(0), 11);
        assert_eq!(channel(5), 11);
        // 2473 MHz sits closest to channel 25 (2475 MHz)
        assert_eq!(channel(DEFAULT_RADIO_CHANNEL), 25);
        assert_eq!(channel(RADIO_CHANNEL_MAX), 26);

        let dbm = |p| RadioConfig::new(0, p, 32).unwrap().tx_power_dbm();
        assert_eq!(dbm(0), -40);
        assert_eq!(dbm(6), 0);
        assert_eq!(dbm(RADIO_POWER_MAX), 4);
    }

    #[test]
    fn test_zero_frame_length_rejected() {
        assert_eq!(RadioConfig::new(10, 3, 0), Err(Error::ZeroFrameLength));
    }

    #[test]
    fn test_zero_pattern_period_rejected() {
        assert_eq!(
            Config::new(RadioConfig::default(), 0, false),
            Err(Error::ZeroPatternPeriod)
        );
        let config = Config::new(RadioConfig::default(), 25, true).unwrap();
        assert_eq!(config.pattern_period_ms, 25);
        assert!(config.broadcast);
    }
}
