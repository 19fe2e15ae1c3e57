//! Integration tests: end-to-end chain sequences using RecordingBus.
//!
//! These tests drive the public API the way a request handler would and
//! check the exact bytes that reach the two lines, plus the saved state.

use ledchain_lib::chain::ChainDriver;
use ledchain_lib::gpio::mock::{RecordingBus, RecordingPin};
use ledchain_lib::protocol::{self, FRAME_BITS, encode_chain};
use ledchain_lib::store::ChainState;
use ledchain_lib::{ColorUpdate, SharedChain};

/// Helper: fresh chain on a recording bus.
fn make_chain() -> (RecordingBus, ChainDriver<RecordingPin, RecordingPin>) {
    let rec = RecordingBus::new();
    let (clk, data) = rec.pins();
    (rec.clone(), ChainDriver::new(clk, data).unwrap())
}

// ── Test: two-node wire image ──

#[test]
fn red_green_chain_wire_bytes() {
    let (rec, mut chain) = make_chain();
    chain.add_controller(Some("B")).unwrap();
    chain.controller_mut(0).unwrap().set_rgb(255, 0, 0).unwrap();
    rec.clear();
    chain.controller_mut(1).unwrap().set_rgb(0, 255, 0).unwrap();

    assert_eq!(
        rec.bytes(),
        vec![
            0x00, 0x00, 0x00, 0x00, //
            0xFC, 0x00, 0x00, 0xFF, //
            0xF3, 0x00, 0xFF, 0x00, //
            0x00, 0x00, 0x00, 0x00,
        ]
    );
}

// ── Test: frames bracket every transmission ──

#[test]
fn every_transmission_is_framed() {
    let (rec, mut chain) = make_chain();
    rec.clear();
    chain.controller_mut(0).unwrap().set_hex("#FFFFFF").unwrap();
    let bits = rec.bits();
    assert!(bits[..FRAME_BITS].iter().all(|b| !b));
    assert!(bits[bits.len() - FRAME_BITS..].iter().all(|b| !b));
    assert_eq!(rec.bytes()[4..8], protocol::encode_node(255, 255, 255));
}

// ── Test: request-layer flow with persistence ──

#[test]
fn add_color_remove_reload_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controllers.json");

    let rec = RecordingBus::new();
    let (clk, data) = rec.pins();
    let shared = SharedChain::open(clk, data, Some(path.clone()), "Controller").unwrap();

    let desk = shared.add_controller(Some("Desk")).unwrap();
    let shelf = shared.add_controller(Some("Shelf")).unwrap();
    assert_eq!((desk, shelf), (1, 2));
    assert!(shared.is_valid_id(shelf));
    assert!(!shared.is_valid_id(3));

    shared.set_color(desk, ColorUpdate::Named("blue".into())).unwrap();
    shared.set_color(shelf, ColorUpdate::Temperature(2700)).unwrap();
    assert!(shared.remove_controller(0).unwrap());

    // Shelf slid down to id 1.
    let shelf = shared.get(1).unwrap();
    assert_eq!(shelf.name(), "Shelf");

    rec.clear();
    shared.refresh().unwrap();
    assert_eq!(
        rec.bytes(),
        encode_chain(shared.controllers().iter().map(|c| c.color().rgb()))
    );

    let saved = ChainState::load(&path).unwrap();
    let names: Vec<&str> = saved.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Desk", "Shelf"]);

    // Reload into a fresh driver.
    let rec2 = RecordingBus::new();
    let (clk2, data2) = rec2.pins();
    let reloaded = SharedChain::open(clk2, data2, Some(path), "Controller").unwrap();
    assert_eq!(reloaded.controllers(), shared.controllers());
    assert_eq!(rec2.bytes(), rec.bytes());
}

// ── Test: sole controller survives removal ──

#[test]
fn sole_controller_cannot_be_removed() {
    let (rec, mut chain) = make_chain();
    rec.clear();
    for _ in 0..3 {
        assert!(!chain.remove_controller(0).unwrap());
    }
    assert_eq!(chain.len(), 1);
    assert!(rec.events().is_empty());
}

// ── Test: snapshot reload keeps HSV exactly ──

#[test]
fn snapshot_roundtrip_keeps_hsv_triples() {
    let (_rec, mut chain) = make_chain();
    chain.controller_mut(0).unwrap().set_hsv(359, 1, 99).unwrap();
    chain.add_controller(Some("two")).unwrap();
    chain.controller_mut(1).unwrap().set_hsv(181, 55, 12).unwrap();

    let json = chain.snapshot().to_json().unwrap();
    let state = ChainState::from_json(&json).unwrap();
    let rec = RecordingBus::new();
    let (clk, data) = rec.pins();
    let restored = ChainDriver::restore(clk, data, &state).unwrap();

    let hsv: Vec<_> = restored.controllers().iter().map(|c| c.color().hsv()).collect();
    assert_eq!(hsv, vec![(359, 1, 99), (181, 55, 12)]);
}

// ── Test: failed structural changes can be retried ──

#[test]
fn retry_after_failed_remove_removes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controllers.json");
    let rec = RecordingBus::new();
    let (clk, data) = rec.pins();
    let shared = SharedChain::open(clk, data, Some(path.clone()), "Controller").unwrap();
    shared.add_controller(Some("A")).unwrap();
    shared.add_controller(Some("B")).unwrap();

    rec.fail_after(5);
    assert!(shared.remove_controller(1).is_err());
    rec.allow_writes();
    assert!(shared.remove_controller(1).unwrap());

    let live: Vec<String> = shared.controllers().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(live, ["Controller 1", "B"]);
    let saved = ChainState::load(&path).unwrap();
    let saved: Vec<&str> = saved.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(saved, ["Controller 1", "B"]);
}

#[test]
fn retry_after_failed_add_adds_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controllers.json");
    let rec = RecordingBus::new();
    let (clk, data) = rec.pins();
    let shared = SharedChain::open(clk, data, Some(path.clone()), "Controller").unwrap();

    rec.fail_after(5);
    assert!(shared.add_controller(Some("X")).is_err());
    assert_eq!(shared.controllers().len(), 1);
    assert!(!path.exists());

    rec.allow_writes();
    assert_eq!(shared.add_controller(Some("X")).unwrap(), 1);
    let saved = ChainState::load(&path).unwrap();
    let saved: Vec<&str> = saved.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(saved, ["Controller 1", "X"]);
}
