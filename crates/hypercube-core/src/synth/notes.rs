/// Frequency of a MIDI note number, A4 (69) = 440 Hz.
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}

/// MIDI number for a scientific pitch name such as `C4`, `F#3` or `Bb5`.
///
/// Octaves 0 through 8 are accepted; anything else yields `None`.
pub fn parse_note_name(name: &str) -> Option<i32> {
    let mut chars = name.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (accidental, octave) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };
    let octave: i32 = octave.parse().ok()?;
    if !(0..=8).contains(&octave) {
        return None;
    }
    Some((octave + 1) * 12 + base + accidental)
}

pub fn note_frequency(name: &str) -> Option<f32> {
    parse_note_name(name).map(|midi| midi_to_hz(midi as f32))
}
