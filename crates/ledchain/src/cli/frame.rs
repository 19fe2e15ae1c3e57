//! Wire-level commands (`frame`, `blank`, `kelvin`).

use super::{
    FrameOutput, GlobalOpts, KelvinOutput, Result, color, kv, kv_width, open_chain,
    open_chain_offline, print_json,
};
use ledchain_lib::protocol::{FRAME_BYTES, NODE_BYTES};

/// Group wire bytes as `frame | node | node | ... | frame`, hex, space-separated.
pub(super) fn format_frame(bytes: &[u8]) -> String {
    let hex = |chunk: &[u8]| chunk.iter().map(|b| format!("{b:02X}")).collect::<String>();
    if bytes.len() < 2 * FRAME_BYTES {
        return hex(bytes);
    }
    let (start, rest) = bytes.split_at(FRAME_BYTES);
    let (nodes, end) = rest.split_at(rest.len() - FRAME_BYTES);
    let mut groups = vec![hex(start)];
    groups.extend(nodes.chunks(NODE_BYTES).map(hex));
    groups.push(hex(end));
    groups.join(" ")
}

pub(super) fn cmd_frame(opts: &GlobalOpts) -> Result<()> {
    let chain = open_chain_offline(opts)?;
    let bytes = chain.frame_bytes();
    let nodes = (bytes.len() - 2 * FRAME_BYTES) / NODE_BYTES;
    let output = FrameOutput {
        nodes,
        bytes: format_frame(&bytes),
    };
    if opts.json {
        return print_json(&output);
    }
    let w = kv_width(&["Nodes:", "Bytes:"], &[]);
    kv("Nodes:", output.nodes, w);
    kv("Bytes:", &output.bytes, w);
    Ok(())
}

pub(super) fn cmd_blank(opts: &GlobalOpts) -> Result<()> {
    let chain = open_chain(opts)?;
    chain.blank()?;
    println!("Blanked {} LED(s)", chain.controllers().len());
    Ok(())
}

pub(super) fn cmd_kelvin(kelvin: u32, json: bool) -> Result<()> {
    let (r, g, b) = color::kelvin_to_rgb(kelvin);
    let hex = color::rgb_to_hex(r, g, b);
    if json {
        return print_json(&KelvinOutput {
            kelvin,
            hex,
            rgb: [r, g, b],
        });
    }
    println!("{hex}");
    Ok(())
}
