//! Unified error type for the ledchain-lib crate.
//!
//! [`LedchainError`] wraps the pin-level [`GpioError`] and I/O errors, plus the
//! domain error kinds (`InvalidFormat`, `IndexOutOfRange`, `Store`, `Config`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::gpio::GpioError;

/// Unified error type for ledchain-lib operations.
#[derive(Debug)]
pub enum LedchainError {
    /// Malformed color string (hex or name). The target color is left unchanged.
    InvalidFormat(String),
    /// Controller id outside `[0, len)`.
    IndexOutOfRange { id: usize, len: usize },
    /// GPIO line could not be opened or written.
    Gpio(GpioError),
    /// Standard I/O error (state file read/write, config persistence).
    Io(std::io::Error),
    /// Saved chain state could not be encoded or decoded.
    Store(String),
    /// Configuration validation error.
    Config(String),
}

impl fmt::Display for LedchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedchainError::InvalidFormat(e) => write!(f, "Invalid format: {e}"),
            LedchainError::IndexOutOfRange { id, len } => {
                write!(f, "Controller id {id} out of range (chain has {len})")
            }
            LedchainError::Gpio(e) => write!(f, "{e}"),
            LedchainError::Io(e) => write!(f, "I/O error: {e}"),
            LedchainError::Store(e) => write!(f, "Store error: {e}"),
            LedchainError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for LedchainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedchainError::Gpio(e) => Some(e),
            LedchainError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpioError> for LedchainError {
    fn from(e: GpioError) -> Self {
        LedchainError::Gpio(e)
    }
}

impl From<std::io::Error> for LedchainError {
    fn from(e: std::io::Error) -> Self {
        LedchainError::Io(e)
    }
}

/// Crate-level Result alias using [`LedchainError`].
pub type Result<T> = std::result::Result<T, LedchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_gpio_error() {
        let e: LedchainError = GpioError::Write("pin 17: busy".into()).into();
        assert!(matches!(e, LedchainError::Gpio(GpioError::Write(_))));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: LedchainError = io_err.into();
        assert!(matches!(e, LedchainError::Io(_)));
    }

    #[test]
    fn display_invalid_format() {
        let e = LedchainError::InvalidFormat("#GG0000".into());
        assert_eq!(e.to_string(), "Invalid format: #GG0000");
    }

    #[test]
    fn display_index_out_of_range() {
        let e = LedchainError::IndexOutOfRange { id: 5, len: 2 };
        assert_eq!(e.to_string(), "Controller id 5 out of range (chain has 2)");
    }

    #[test]
    fn display_gpio_error() {
        let e = LedchainError::Gpio(GpioError::Open("pin 27: no such device".into()));
        assert_eq!(e.to_string(), "Failed to open GPIO line: pin 27: no such device");
    }

    #[test]
    fn display_store_error() {
        let e = LedchainError::Store("bad json".into());
        assert_eq!(e.to_string(), "Store error: bad json");
    }

    #[test]
    fn display_config_error() {
        let e = LedchainError::Config("pins collide".into());
        assert_eq!(e.to_string(), "Config error: pins collide");
    }

    #[test]
    fn source_chains_gpio_error() {
        let e = LedchainError::Gpio(GpioError::Write("timeout".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = LedchainError::Store("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_gpio_to_ledchain() {
        fn inner() -> std::result::Result<(), GpioError> {
            Err(GpioError::Write("stuck".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, LedchainError::Gpio(GpioError::Write(_))));
    }
}
