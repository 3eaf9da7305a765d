// Browser-side wiring constants. Kept free of web-sys so the host tests can
// include this file directly.

// DOM
pub const CANVAS_ID: &str = "hypercube-canvas";

// Events that resolve the audio readiness gate (browsers require a gesture)
pub const FIRST_INTERACTION_EVENTS: [&str; 3] = ["click", "keydown", "touchstart"];

// Computer keyboard as a one-octave piano, C4..C5 chromatic
pub const KEYBOARD_NOTES: [(&str, &str); 13] = [
    ("a", "C4"),
    ("w", "C#4"),
    ("s", "D4"),
    ("e", "D#4"),
    ("d", "E4"),
    ("f", "F4"),
    ("t", "F#4"),
    ("g", "G4"),
    ("y", "G#4"),
    ("h", "A4"),
    ("u", "A#4"),
    ("j", "B4"),
    ("k", "C5"),
];

// Key releases fade over the envelope's release time
pub const KEY_RELEASE_USES_ENVELOPE: bool = true;

/// Note name bound to a computer key, case-insensitive.
pub fn note_for_key(key: &str) -> Option<&'static str> {
    KEYBOARD_NOTES
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|&(_, note)| note)
}
