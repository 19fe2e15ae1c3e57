//! GPIO output lines for the clock and data signals, plus a recording mock.
//!
//! The chain driver only ever drives two lines high or low, so any
//! [`embedded_hal::digital::OutputPin`] works as a sink. The driver never reads
//! a line back.

use std::fmt;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

// ── Error type ──

/// GPIO line errors.
///
/// String payloads follow the convention **"context: details"**, where
/// *context* names the pin or line (e.g. `"pin 17"`, `"clock line"`).
#[derive(Debug)]
pub enum GpioError {
    /// Export, direction setup, or value file open failed.
    Open(String),
    /// Driving the line failed.
    Write(String),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::Open(e) => write!(f, "Failed to open GPIO line: {e}"),
            GpioError::Write(e) => write!(f, "GPIO write failed: {e}"),
        }
    }
}

impl std::error::Error for GpioError {}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// The two logical lines of a P9813 chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Clock,
    Data,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Clock => f.write_str("clock"),
            Line::Data => f.write_str("data"),
        }
    }
}

// ── No-op backend ──

/// Stand-in line for hosts without GPIO. Toggles are logged at trace level.
#[derive(Debug)]
pub struct NoopPin {
    line: Line,
}

impl NoopPin {
    pub fn new(line: Line) -> Self {
        NoopPin { line }
    }
}

impl ErrorType for NoopPin {
    type Error = GpioError;
}

impl OutputPin for NoopPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        log::trace!("{} line low", self.line);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        log::trace!("{} line high", self.line);
        Ok(())
    }
}

// ── Linux sysfs backend ──

#[cfg(target_os = "linux")]
pub use sysfs::{SYSFS_GPIO_ROOT, SysfsPin, sysfs_available};

#[cfg(target_os = "linux")]
mod sysfs {
    use std::fs::{File, OpenOptions};
    use std::os::unix::fs::FileExt;
    use std::path::{Path, PathBuf};

    use embedded_hal::digital::{ErrorType, OutputPin};

    use super::GpioError;

    /// Default sysfs GPIO class directory.
    pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

    /// Whether the sysfs GPIO interface is present on this host.
    pub fn sysfs_available() -> bool {
        Path::new(SYSFS_GPIO_ROOT).join("export").exists()
    }

    /// Output line backed by `/sys/class/gpio/gpioN/value`.
    ///
    /// Opening exports the pin (if needed) and sets its direction to `out`.
    /// The value file stays open for the lifetime of the pin.
    #[derive(Debug)]
    pub struct SysfsPin {
        pin: u32,
        value: File,
    }

    impl SysfsPin {
        /// Open a BCM pin under the default sysfs root.
        pub fn open(pin: u32) -> Result<Self, GpioError> {
            Self::open_at(Path::new(SYSFS_GPIO_ROOT), pin)
        }

        /// Open a pin under an arbitrary sysfs-style root directory.
        pub fn open_at(root: &Path, pin: u32) -> Result<Self, GpioError> {
            let dir: PathBuf = root.join(format!("gpio{pin}"));
            if !dir.exists() {
                std::fs::write(root.join("export"), pin.to_string())
                    .map_err(|e| GpioError::Open(format!("pin {pin}: export: {e}")))?;
            }
            std::fs::write(dir.join("direction"), "out")
                .map_err(|e| GpioError::Open(format!("pin {pin}: direction: {e}")))?;
            let value = OpenOptions::new()
                .write(true)
                .open(dir.join("value"))
                .map_err(|e| GpioError::Open(format!("pin {pin}: value: {e}")))?;
            log::debug!("opened sysfs GPIO pin {pin}");
            Ok(SysfsPin { pin, value })
        }

        pub fn pin(&self) -> u32 {
            self.pin
        }

        fn write_level(&mut self, level: &[u8]) -> Result<(), GpioError> {
            self.value
                .write_at(level, 0)
                .map(|_| ())
                .map_err(|e| GpioError::Write(format!("pin {}: {e}", self.pin)))
        }
    }

    impl ErrorType for SysfsPin {
        type Error = GpioError;
    }

    impl OutputPin for SysfsPin {
        fn set_low(&mut self) -> Result<(), GpioError> {
            self.write_level(b"0")
        }

        fn set_high(&mut self) -> Result<(), GpioError> {
            self.write_level(b"1")
        }
    }
}

// ── Runtime backend selection ──

/// A line from whichever backend the configuration selected.
#[derive(Debug)]
pub enum AnyPin {
    #[cfg(target_os = "linux")]
    Sysfs(SysfsPin),
    Noop(NoopPin),
}

impl ErrorType for AnyPin {
    type Error = GpioError;
}

impl OutputPin for AnyPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        match self {
            #[cfg(target_os = "linux")]
            AnyPin::Sysfs(p) => p.set_low(),
            AnyPin::Noop(p) => p.set_low(),
        }
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        match self {
            #[cfg(target_os = "linux")]
            AnyPin::Sysfs(p) => p.set_high(),
            AnyPin::Noop(p) => p.set_high(),
        }
    }
}

/// Open the clock and data lines for `backend`.
///
/// `Auto` picks sysfs when the host exposes it and falls back to no-op lines
/// with a warning. An explicit `Sysfs` fails if either line can't be opened.
pub fn open_lines(
    backend: crate::config::Backend,
    clock_pin: u32,
    data_pin: u32,
) -> Result<(AnyPin, AnyPin), GpioError> {
    use crate::config::Backend;

    let noop = || {
        (
            AnyPin::Noop(NoopPin::new(Line::Clock)),
            AnyPin::Noop(NoopPin::new(Line::Data)),
        )
    };

    match backend {
        Backend::Noop => Ok(noop()),
        #[cfg(target_os = "linux")]
        Backend::Sysfs => Ok((
            AnyPin::Sysfs(SysfsPin::open(clock_pin)?),
            AnyPin::Sysfs(SysfsPin::open(data_pin)?),
        )),
        #[cfg(target_os = "linux")]
        Backend::Auto if sysfs_available() => Ok((
            AnyPin::Sysfs(SysfsPin::open(clock_pin)?),
            AnyPin::Sysfs(SysfsPin::open(data_pin)?),
        )),
        #[cfg(not(target_os = "linux"))]
        Backend::Sysfs => {
            let _ = (clock_pin, data_pin);
            Err(GpioError::Open(
                "sysfs: GPIO is not supported on this platform".into(),
            ))
        }
        Backend::Auto => {
            log::warn!("no GPIO interface found, using no-op lines (LEDs will not change)");
            Ok(noop())
        }
    }
}

// ── Recording mock for testing ──

/// Recording lines for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use embedded_hal::digital::{ErrorType, OutputPin};

    use super::{GpioError, Line};

    #[derive(Debug, Default)]
    struct Recording {
        /// Every level change in call order: (line, high).
        events: Vec<(Line, bool)>,
        /// If set, writes fail once this many events have been recorded.
        fail_after: Option<usize>,
    }

    /// Shared log of both lines. Clones observe the same recording.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingBus {
        inner: Arc<Mutex<Recording>>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self::default()
        }

        /// Clock and data pins writing into this recording.
        pub fn pins(&self) -> (RecordingPin, RecordingPin) {
            (
                RecordingPin {
                    line: Line::Clock,
                    bus: self.clone(),
                },
                RecordingPin {
                    line: Line::Data,
                    bus: self.clone(),
                },
            )
        }

        fn lock(&self) -> MutexGuard<'_, Recording> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Raw level changes in call order.
        pub fn events(&self) -> Vec<(Line, bool)> {
            self.lock().events.clone()
        }

        pub fn clear(&self) {
            self.lock().events.clear();
        }

        /// Make every write fail after `n` more recorded events.
        pub fn fail_after(&self, n: usize) {
            let mut rec = self.lock();
            rec.fail_after = Some(rec.events.len() + n);
        }

        /// Undo [`fail_after`](Self::fail_after).
        pub fn allow_writes(&self) {
            self.lock().fail_after = None;
        }

        /// Data level sampled at each clock rising edge.
        pub fn bits(&self) -> Vec<bool> {
            let mut data = false;
            let mut clock = false;
            let mut bits = Vec::new();
            for &(line, high) in &self.lock().events {
                match line {
                    Line::Data => data = high,
                    Line::Clock => {
                        if high && !clock {
                            bits.push(data);
                        }
                        clock = high;
                    }
                }
            }
            bits
        }

        /// Sampled bits packed MSB first. Trailing partial bytes are dropped.
        pub fn bytes(&self) -> Vec<u8> {
            self.bits()
                .chunks_exact(8)
                .map(|bits| bits.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
                .collect()
        }

        /// Number of clock rising edges recorded.
        pub fn clock_pulses(&self) -> usize {
            self.bits().len()
        }
    }

    /// One line of a [`RecordingBus`].
    #[derive(Debug)]
    pub struct RecordingPin {
        line: Line,
        bus: RecordingBus,
    }

    impl RecordingPin {
        fn record(&mut self, high: bool) -> Result<(), GpioError> {
            let mut rec = self.bus.lock();
            if rec.fail_after.is_some_and(|n| rec.events.len() >= n) {
                return Err(GpioError::Write(format!("{} line: injected failure", self.line)));
            }
            rec.events.push((self.line, high));
            Ok(())
        }
    }

    impl ErrorType for RecordingPin {
        type Error = GpioError;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), GpioError> {
            self.record(false)
        }

        fn set_high(&mut self) -> Result<(), GpioError> {
            self.record(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingBus;
    use super::*;

    #[test]
    fn display_errors() {
        assert_eq!(
            GpioError::Open("pin 4: denied".into()).to_string(),
            "Failed to open GPIO line: pin 4: denied"
        );
        assert_eq!(
            GpioError::Write("pin 4: busy".into()).to_string(),
            "GPIO write failed: pin 4: busy"
        );
    }

    #[test]
    fn writes_resume_after_allow_writes() {
        let bus = RecordingBus::new();
        let (mut clk, _data) = bus.pins();
        bus.fail_after(0);
        assert!(clk.set_high().is_err());
        bus.allow_writes();
        assert!(clk.set_high().is_ok());
        assert_eq!(bus.clock_pulses(), 1);
    }

    #[test]
    fn noop_pin_always_succeeds() {
        let mut pin = NoopPin::new(Line::Data);
        assert!(pin.set_high().is_ok());
        assert!(pin.set_low().is_ok());
    }

    #[test]
    fn open_lines_noop() {
        let (mut clk, mut data) = open_lines(crate::config::Backend::Noop, 27, 17).unwrap();
        assert!(matches!(clk, AnyPin::Noop(_)));
        assert!(clk.set_high().is_ok());
        assert!(data.set_low().is_ok());
    }

    #[test]
    fn recording_samples_on_rising_edge() {
        let bus = RecordingBus::new();
        let (mut clk, mut data) = bus.pins();
        for bit in [true, false, true, true, false, false, true, false] {
            if bit {
                data.set_high().unwrap();
            } else {
                data.set_low().unwrap();
            }
            clk.set_low().unwrap();
            clk.set_high().unwrap();
        }
        assert_eq!(bus.bytes(), vec![0b1011_0010]);
        assert_eq!(bus.clock_pulses(), 8);
    }

    #[test]
    fn repeated_high_is_one_edge() {
        let bus = RecordingBus::new();
        let (mut clk, _data) = bus.pins();
        clk.set_high().unwrap();
        clk.set_high().unwrap();
        assert_eq!(bus.clock_pulses(), 1);
    }

    #[test]
    fn injected_failure() {
        let bus = RecordingBus::new();
        let (mut clk, _data) = bus.pins();
        bus.fail_after(1);
        assert!(clk.set_low().is_ok());
        assert!(matches!(clk.set_high(), Err(GpioError::Write(_))));
        assert_eq!(bus.events().len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sysfs_exports_and_writes_levels() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("export"), "").unwrap();
        let dir = root.path().join("gpio17");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("direction"), "in").unwrap();
        std::fs::write(dir.join("value"), "0").unwrap();

        let mut pin = SysfsPin::open_at(root.path(), 17).unwrap();
        assert_eq!(pin.pin(), 17);
        assert_eq!(std::fs::read_to_string(dir.join("direction")).unwrap(), "out");
        pin.set_high().unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("value")).unwrap(), "1");
        pin.set_low().unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("value")).unwrap(), "0");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sysfs_export_writes_pin_number() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("export"), "").unwrap();
        // No gpio27 directory appears (no kernel behind it), so direction fails.
        let err = SysfsPin::open_at(root.path(), 27).unwrap_err();
        assert!(matches!(err, GpioError::Open(_)));
        assert_eq!(
            std::fs::read_to_string(root.path().join("export")).unwrap(),
            "27"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sysfs_missing_root_fails_fast() {
        let root = tempfile::tempdir().unwrap();
        let err = SysfsPin::open_at(&root.path().join("nope"), 5).unwrap_err();
        assert!(err.to_string().contains("pin 5"));
    }
}
