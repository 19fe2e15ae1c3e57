//! Application configuration: TOML file under the platform config directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which GPIO implementation drives the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// sysfs when the host has it, otherwise no-op (with a warning).
    #[default]
    Auto,
    /// Linux `/sys/class/gpio`.
    Sysfs,
    /// Log-only stand-in for hosts without GPIO.
    Noop,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Auto => f.write_str("auto"),
            Backend::Sysfs => f.write_str("sysfs"),
            Backend::Noop => f.write_str("noop"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = crate::LedchainError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "sysfs" => Ok(Backend::Sysfs),
            "noop" => Ok(Backend::Noop),
            other => Err(crate::LedchainError::Config(format!(
                "unknown backend \"{other}\" (use auto, sysfs or noop)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// BCM pin number of the clock line. Default: 27.
    #[serde(default = "default_clock_pin")]
    pub clock_pin: u32,

    /// BCM pin number of the data line. Default: 17.
    #[serde(default = "default_data_pin")]
    pub data_pin: u32,

    /// GPIO backend: "auto", "sysfs" or "noop". Default: "auto".
    #[serde(default)]
    pub backend: Backend,

    /// Path to the saved chain state. Empty = platform data directory.
    #[serde(default)]
    pub state_path: String,

    /// Prefix for generated controller names. Default: "Controller".
    #[serde(default = "default_name")]
    pub default_name: String,
}

fn default_clock_pin() -> u32 {
    27
}
fn default_data_pin() -> u32 {
    17
}
fn default_name() -> String {
    crate::chain::DEFAULT_NAME_PREFIX.into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_pin: default_clock_pin(),
            data_pin: default_data_pin(),
            backend: Backend::default(),
            state_path: String::new(),
            default_name: default_name(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Clock and data are configured on the same pin.
    SamePin(u32),
    /// The `default_name` field is empty or whitespace-only.
    EmptyDefaultName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SamePin(p) => {
                write!(f, "clock_pin and data_pin are both {p}")
            }
            ValidationError::EmptyDefaultName => write!(f, "default_name cannot be empty"),
        }
    }
}

impl Config {
    /// Platform config file, `<config dir>/ledchain/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ledchain").join("config.toml"))
    }

    /// Where the chain state lives: `state_path` if set, else the platform default.
    pub fn state_file(&self) -> Option<PathBuf> {
        let custom = self.state_path.trim();
        if custom.is_empty() {
            crate::store::default_path()
        } else {
            Some(PathBuf::from(custom))
        }
    }

    /// Read `custom`, or the platform config file when `None`.
    ///
    /// Problems never fail the load: they fall back to defaults and come back
    /// as warnings for the caller to report.
    pub fn load_at(custom: Option<&Path>) -> (Self, Vec<String>) {
        match custom.map(Path::to_path_buf).or_else(Self::path) {
            Some(path) => Self::load_from(&path),
            None => (Self::default(), vec![]),
        }
    }

    /// Parse one config file. A missing file is silently the defaults.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (Self::default(), vec![]);
            }
            Err(e) => {
                let warning = format!(
                    "config unreadable ({}), using defaults: {e}",
                    path.display()
                );
                return (Self::default(), vec![warning]);
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => {
                log::debug!("loaded config from {}", path.display());
                (config, vec![])
            }
            Err(e) => {
                let warning = format!(
                    "config parse error ({}), using defaults: {e}",
                    path.display()
                );
                (Self::default(), vec![warning])
            }
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.clock_pin == self.data_pin {
            errors.push(ValidationError::SamePin(self.clock_pin));
        }
        if self.default_name.trim().is_empty() {
            errors.push(ValidationError::EmptyDefaultName);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate), folded into a single crate error.
    pub fn check(&self) -> crate::error::Result<()> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            crate::LedchainError::Config(msgs.join("; "))
        })
    }
}
