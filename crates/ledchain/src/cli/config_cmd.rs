//! `config` subcommand: show current configuration and file paths.

use super::{
    Config, ConfigOutput, GlobalOpts, Result, effective_config, kv, kv_indent, kv_width,
    print_json,
};

pub(super) fn cmd_config(opts: &GlobalOpts) -> Result<()> {
    let config = effective_config(opts)?;
    let config_path = opts.config.clone().or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let state_path = config.state_file();
    let state_exists = state_path.as_ref().is_some_and(|p| p.exists());

    if opts.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            state_file: state_path.as_ref().map(|p| p.display().to_string()),
            state_file_exists: state_exists,
            settings: config,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &["clock_pin:", "data_pin:", "backend:", "default_name:", "State file:"],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("clock_pin:", config.clock_pin, w);
    kv_indent("data_pin:", config.data_pin, w);
    kv_indent("backend:", config.backend, w);
    kv_indent("default_name:", &config.default_name, w);
    println!();

    println!("Files:");
    match &state_path {
        Some(p) => {
            let status = if state_exists { "present" } else { "not found" };
            kv_indent("State file:", format_args!("{} ({status})", p.display()), w);
        }
        None => kv_indent("State file:", "(no data directory)", w),
    }
    Ok(())
}
