//! Controller edits: add, remove, rename and recolor.
//!
//! Each command opens the chain (re-sending the saved state), applies one
//! change through [`SharedChain`](super::SharedChain), which transmits and
//! then saves.

use super::{ColorUpdate, ControllerJson, GlobalOpts, Result, open_chain, print_json};

fn print_controller(c: &super::Controller, json: bool) -> Result<()> {
    if json {
        return print_json(&ControllerJson::from(c));
    }
    let (h, s, v) = c.color().hsv();
    println!("{} {}: {} (hsv {h}, {s}, {v})", c.id(), c.name(), c.color().hex());
    Ok(())
}

pub(super) fn cmd_add(opts: &GlobalOpts, name: Option<&str>) -> Result<()> {
    let chain = open_chain(opts)?;
    let id = chain.add_controller(name)?;
    print_controller(&chain.get(id)?, opts.json)
}

pub(super) fn cmd_remove(opts: &GlobalOpts, id: usize) -> Result<()> {
    let chain = open_chain(opts)?;
    let removed = chain.remove_controller(id)?;
    if opts.json {
        return print_json(&serde_json::json!({ "id": id, "removed": removed }));
    }
    if removed {
        println!("Removed controller {id}");
    } else {
        // Out-of-range ids and the last controller are ignored, not errors.
        println!("Controller {id} not removed (no such id, or it is the last one)");
    }
    Ok(())
}

pub(super) fn cmd_rename(opts: &GlobalOpts, id: usize, name: &str) -> Result<()> {
    let chain = open_chain(opts)?;
    chain.set_name(id, name)?;
    print_controller(&chain.get(id)?, opts.json)
}

pub(super) fn cmd_color(opts: &GlobalOpts, id: usize, update: ColorUpdate) -> Result<()> {
    // Reject malformed colors before touching the hardware.
    if let ColorUpdate::Named(ref s) = update {
        super::color::parse_color(s)?;
    }
    let chain = open_chain(opts)?;
    let c = chain.set_color(id, update)?;
    print_controller(&c, opts.json)
}
