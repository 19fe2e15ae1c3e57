//! CLI subcommands.

mod config_cmd;
mod edit;
mod frame;
mod list;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use ledchain_lib::color;
pub(super) use ledchain_lib::config::{Backend, Config};
pub(super) use ledchain_lib::error::Result;
pub(super) use ledchain_lib::gpio::{self, AnyPin};
pub(super) use ledchain_lib::{ColorUpdate, Controller, SharedChain};

const PADDING: usize = 2;

/// Options shared by every subcommand.
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub backend: Option<String>,
}

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print a serializable value as pretty JSON.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ledchain_lib::LedchainError::Store(e.to_string()))?;
    println!("{text}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ControllerJson {
    pub id: usize,
    pub name: String,
    pub hex: String,
    pub hsv: [u16; 3],
}

impl From<&Controller> for ControllerJson {
    fn from(c: &Controller) -> Self {
        ControllerJson {
            id: c.id(),
            name: c.name().to_string(),
            hex: c.color().hex(),
            hsv: c.color().into(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct ListOutput {
    pub count: usize,
    pub controllers: Vec<ControllerJson>,
}

#[derive(Serialize)]
pub(super) struct FrameOutput {
    pub nodes: usize,
    pub bytes: String,
}

#[derive(Serialize)]
pub(super) struct KelvinOutput {
    pub kelvin: u32,
    pub hex: String,
    pub rgb: [u8; 3],
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub state_file: Option<String>,
    pub state_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// List controllers in chain order
    List,

    /// Show one controller
    Show {
        /// Controller id (0-based position in the chain)
        id: usize,
    },

    /// Append a controller to the end of the chain (color off)
    Add {
        /// Display name (default: generated from the position)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a controller; the rest are renumbered
    Remove {
        /// Controller id
        id: usize,
    },

    /// Rename a controller
    Rename {
        /// Controller id
        id: usize,
        /// New display name
        name: String,
    },

    /// Set a controller's color from hex (#RRGGBB) or a color name
    Color {
        /// Controller id
        id: usize,
        /// Hex color or name (red, green, blue, white, orange, yellow, purple, cyan, off)
        color: String,
    },

    /// Set a controller's color from hue (0-359), saturation and value (0-100)
    Hsv {
        /// Controller id
        id: usize,
        #[arg(value_parser = clap::value_parser!(u16).range(0..360))]
        h: u16,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        s: u8,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        v: u8,
    },

    /// Set a controller's color from a color temperature, keeping brightness
    Warmth {
        /// Controller id
        id: usize,
        /// Temperature in Kelvin (clamped to 1000-40000)
        kelvin: u32,
    },

    /// Set a controller's brightness (HSV value) in percent
    Brightness {
        /// Controller id
        id: usize,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Turn every LED off without changing the saved colors
    Blank,

    /// Print the exact bytes sent for the current chain (no hardware access)
    Frame,

    /// Print the color of a temperature (no hardware access)
    Kelvin {
        /// Temperature in Kelvin (clamped to 1000-40000)
        kelvin: u32,
    },

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

/// Load config from a custom path or the platform default, logging warnings.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = Config::load_at(custom_path);
    for w in &warnings {
        log::warn!("{w}");
    }
    config
}

/// Effective config with command-line overrides applied and validated.
pub(super) fn effective_config(opts: &GlobalOpts) -> Result<Config> {
    let mut config = load_config(opts.config.as_deref());
    if let Some(backend) = &opts.backend {
        config.backend = backend.parse()?;
    }
    if let Some(state) = &opts.state {
        config.state_path = state.display().to_string();
    }
    config.check()?;
    Ok(config)
}

/// Open the configured lines and load the saved chain (transmits once).
pub(super) fn open_chain(opts: &GlobalOpts) -> Result<SharedChain<AnyPin, AnyPin>> {
    let config = effective_config(opts)?;
    open_with_backend(&config, config.backend)
}

/// Load the saved chain without touching the hardware.
pub(super) fn open_chain_offline(opts: &GlobalOpts) -> Result<SharedChain<AnyPin, AnyPin>> {
    let config = effective_config(opts)?;
    open_with_backend(&config, Backend::Noop)
}

fn open_with_backend(config: &Config, backend: Backend) -> Result<SharedChain<AnyPin, AnyPin>> {
    let (clock, data) = gpio::open_lines(backend, config.clock_pin, config.data_pin)?;
    SharedChain::open(clock, data, config.state_file(), &config.default_name)
}

pub fn run(cmd: Command, opts: &GlobalOpts) -> Result<()> {
    let json = opts.json;
    match cmd {
        Command::List => list::cmd_list(opts),
        Command::Show { id } => list::cmd_show(opts, id),
        Command::Add { name } => edit::cmd_add(opts, name.as_deref()),
        Command::Remove { id } => edit::cmd_remove(opts, id),
        Command::Rename { id, name } => edit::cmd_rename(opts, id, &name),
        Command::Color { id, color } => edit::cmd_color(opts, id, ColorUpdate::Named(color)),
        Command::Hsv { id, h, s, v } => edit::cmd_color(opts, id, ColorUpdate::Hsv(h, s, v)),
        Command::Warmth { id, kelvin } => {
            edit::cmd_color(opts, id, ColorUpdate::Temperature(kelvin))
        }
        Command::Brightness { id, percent } => {
            edit::cmd_color(opts, id, ColorUpdate::Brightness(percent))
        }
        Command::Blank => {
            if json {
                warn_json_unsupported("blank");
            }
            frame::cmd_blank(opts)
        }
        Command::Frame => frame::cmd_frame(opts),
        Command::Kelvin { kelvin } => frame::cmd_kelvin(kelvin, json),
        Command::Config => config_cmd::cmd_config(opts),
    }
}


#[cfg(test)]
mod json_struct_tests {
    use super::*;

    #[test]
    fn controller_json_fields() {
        let out = ControllerJson {
            id: 2,
            name: "Desk".into(),
            hex: "#FF0000".into(),
            hsv: [0, 100, 100],
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["hsv"], serde_json::json!([0, 100, 100]));
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn frame_output_fields() {
        let out = FrameOutput {
            nodes: 1,
            bytes: "00000000 FF000000 00000000".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["nodes"], 1);
        assert!(json["bytes"].is_string());
    }

    #[test]
    fn config_output_nests_settings() {
        let out = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            state_file: Some("/tmp/x.json".into()),
            state_file_exists: false,
            settings: Config::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["settings"]["clock_pin"], 27);
        assert_eq!(json["settings"]["backend"], "auto");
    }
}
