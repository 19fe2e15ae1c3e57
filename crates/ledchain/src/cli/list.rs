//! `list` / `show` subcommands: print the saved chain.

use super::{
    ControllerJson, GlobalOpts, ListOutput, Result, kv, kv_width, open_chain_offline, print_json,
};

/// Width of the name column, in characters (padding counts chars, not bytes).
fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len())
}

pub(super) fn cmd_list(opts: &GlobalOpts) -> Result<()> {
    let chain = open_chain_offline(opts)?;
    let controllers = chain.controllers();

    if opts.json {
        let output = ListOutput {
            count: controllers.len(),
            controllers: controllers.iter().map(ControllerJson::from).collect(),
        };
        return print_json(&output);
    }

    let name_w = name_width(controllers.iter().map(|c| c.name()));
    println!("{:<4}{:<name_w$}  {:<9}HSV", "Id", "Name", "Color");
    for c in &controllers {
        let (h, s, v) = c.color().hsv();
        println!(
            "{:<4}{:<name_w$}  {:<9}{h}, {s}, {v}",
            c.id(),
            c.name(),
            c.color().hex()
        );
    }
    Ok(())
}

pub(super) fn cmd_show(opts: &GlobalOpts, id: usize) -> Result<()> {
    let chain = open_chain_offline(opts)?;
    let c = chain.get(id)?;

    if opts.json {
        return print_json(&ControllerJson::from(&c));
    }

    let (h, s, v) = c.color().hsv();
    let (r, g, b) = c.color().rgb();
    let w = kv_width(&["Id:", "Name:", "Color:", "HSV:", "RGB:"], &[]);
    kv("Id:", c.id(), w);
    kv("Name:", c.name(), w);
    kv("Color:", c.color().hex(), w);
    kv("HSV:", format_args!("{h}, {s}, {v}"), w);
    kv("RGB:", format_args!("{r}, {g}, {b}"), w);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_width_counts_chars() {
        assert_eq!(name_width(["Küche", "Bad"].into_iter()), 5);
        assert_eq!(name_width(["Wohnzimmer ☀"].into_iter()), 12);
    }

    #[test]
    fn name_width_at_least_header() {
        assert_eq!(name_width(["A"].into_iter()), 4);
        assert_eq!(name_width(std::iter::empty()), 4);
    }

    #[test]
    fn padded_non_ascii_names_align() {
        let w = name_width(["Küche", "Garage"].into_iter());
        let a = format!("{:<w$}|", "Küche");
        let b = format!("{:<w$}|", "Garage");
        assert_eq!(a.chars().count(), b.chars().count());
    }
}
