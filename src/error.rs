//! # Errors
//!
//! The shell has no fatal path. Every variant here is either a
//! configuration mistake caught at startup or a condition the runtime
//! logs and degrades around (an empty registry makes it idle).
//!
//! Button presses are *not* errors: they travel as
//! [`Resume::Failed`](crate::task::Resume::Failed).

use core::fmt;

/// A [`Result`](core::result::Result) with [`Error`] as default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No programs registered; nothing can become active.
    RegistryEmpty,
    /// The registry already holds `capacity` programs.
    RegistryFull { capacity: usize },
    /// Radio channel above `RADIO_CHANNEL_MAX`.
    ChannelOutOfRange(u8),
    /// Radio power above `RADIO_POWER_MAX`.
    PowerOutOfRange(u8),
    /// A pattern period of zero would never suspend.
    ZeroPatternPeriod,
    /// A radio frame length setting of zero bytes.
    ZeroFrameLength,
    /// A radio frame (or frame length setting) exceeds what the radio accepts.
    FrameTooLong { len: usize, max: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RegistryEmpty => f.write_str("no programs available"),
            Error::RegistryFull { capacity } => {
                write!(f, "program registry full ({} slots)", capacity)
            }
            Error::ChannelOutOfRange(channel) => {
                write!(f, "radio channel {} out of range", channel)
            }
            Error::PowerOutOfRange(power) => write!(f, "radio power {} out of range", power),
            Error::ZeroPatternPeriod => f.write_str("pattern period must be non-zero"),
            Error::ZeroFrameLength => f.write_str("radio frame length must be non-zero"),
            Error::FrameTooLong { len, max } => {
                write!(f, "radio frame of {} bytes exceeds {}", len, max)
            }
        }
    }
}

impl core::error::Error for Error {}
