// Host-side tests for wiring constants and core tuning values.
// The web crate is wasm-only, so its constants file is included directly.

#![allow(dead_code)]
mod constants {
    include!("../src/constants.rs");
}

use constants::*;
use hypercube_core::constants as core;
use hypercube_core::synth::notes::note_frequency;

#[test]
fn every_key_maps_to_a_playable_note() {
    for (key, note) in KEYBOARD_NOTES {
        assert_eq!(key.len(), 1, "{key}");
        assert!(note_frequency(note).is_some(), "{note}");
    }
}

#[test]
fn keyboard_notes_rise_chromatically() {
    let freqs: Vec<f32> = KEYBOARD_NOTES
        .iter()
        .filter_map(|(_, n)| note_frequency(n))
        .collect();
    for pair in freqs.windows(2) {
        let ratio = pair[1] / pair[0];
        assert!((ratio - 2f32.powf(1.0 / 12.0)).abs() < 1e-3);
    }
    assert!((freqs[12] / freqs[0] - 2.0).abs() < 1e-3);
}

#[test]
fn key_lookup_ignores_case_and_rejects_unmapped_keys() {
    assert_eq!(note_for_key("A"), Some("C4"));
    assert_eq!(note_for_key("k"), Some("C5"));
    assert_eq!(note_for_key("z"), None);
    assert_eq!(note_for_key("Shift"), None);
}

#[test]
fn keys_are_unique() {
    let mut keys: Vec<&str> = KEYBOARD_NOTES.iter().map(|(k, _)| *k).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), KEYBOARD_NOTES.len());
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn core_timing_constants_are_consistent() {
    assert!(core::MIN_FADE_SEC > 0.0);
    assert!(core::ARP_STOP_FADE_SEC >= core::MIN_FADE_SEC);
    assert!(core::CLEANUP_BUFFER_SEC > core::STOP_MARGIN_SEC);
    assert!(core::ARP_ATTACK_FRACTION < core::ARP_HOLD_FRACTION);
    assert!(core::ARP_HOLD_FRACTION < 1.0);
    assert!(core::ARP_MIN_RATE > 0.0 && core::ARP_MIN_RATE < core::ARP_MAX_RATE);
    assert!(core::MIN_REVERB_DECAY_SEC > 0.0);
    assert!(core::MIN_REVERB_DECAY_SEC < core::MAX_REVERB_DECAY_SEC);
    assert!(core::MIN_FILTER_HZ > 0.0);
}

#[test]
fn quad_covers_clip_space() {
    for v in core::QUAD_VERTICES {
        assert!(v.iter().all(|c| c.abs() == 1.0));
    }
    assert_eq!(core::POSITION_ATTRIBUTE, "a_position");
}
