use smallvec::smallvec;

use super::params::EffectParameters;
use crate::audio::{FilterKind, Waveform};

type Patch = fn(&mut EffectParameters);

const PRESETS: &[(&str, Patch)] = &[
    ("default", |_| {}),
    ("vaporwave", |p| {
        p.oscillator.waveform = Waveform::Triangle;
        p.filter.frequency = 800.0;
        p.filter.q = 2.0;
        p.envelope.attack = 0.3;
        p.envelope.release = 1.5;
        p.effects.reverb.active = true;
        p.effects.reverb.decay = 4.0;
        p.effects.reverb.wet = 0.7;
        p.effects.delay.active = true;
        p.effects.delay.time = 0.45;
        p.effects.delay.feedback = 0.35;
    }),
    ("ambient_drone", |p| {
        p.oscillator.waveform = Waveform::Sine;
        p.oscillator.gain = 0.4;
        p.filter.frequency = 600.0;
        p.envelope.attack = 1.5;
        p.envelope.release = 3.0;
        p.effects.reverb.active = true;
        p.effects.reverb.decay = 8.0;
        p.effects.reverb.wet = 0.8;
    }),
    ("synthwave_lead", |p| {
        p.oscillator.waveform = Waveform::Saw;
        p.oscillator.gain = 0.6;
        p.filter.frequency = 2500.0;
        p.filter.q = 6.0;
        p.envelope.attack = 0.02;
        p.envelope.release = 0.4;
        p.effects.delay.active = true;
        p.effects.delay.time = 0.375;
        p.effects.delay.feedback = 0.45;
    }),
    ("glitch_bass", |p| {
        p.oscillator.waveform = Waveform::Square;
        p.oscillator.gain = 0.7;
        p.filter.frequency = 400.0;
        p.filter.q = 12.0;
        p.envelope.attack = 0.005;
        p.envelope.release = 0.15;
        p.effects.glitch.active = true;
    }),
    ("crystal_pad", |p| {
        p.oscillator.waveform = Waveform::Triangle;
        p.oscillator.gain = 0.45;
        p.filter.kind = FilterKind::Highpass;
        p.filter.frequency = 900.0;
        p.envelope.attack = 0.8;
        p.envelope.release = 2.5;
        p.effects.reverb.active = true;
        p.effects.reverb.decay = 5.0;
        p.effects.reverb.wet = 0.6;
        p.effects.delay.active = true;
        p.effects.delay.time = 0.6;
        p.effects.delay.feedback = 0.3;
    }),
    ("arp_sequence", |p| {
        p.oscillator.waveform = Waveform::Square;
        p.oscillator.gain = 0.4;
        p.filter.frequency = 1800.0;
        p.filter.q = 4.0;
        p.envelope.attack = 0.01;
        p.envelope.release = 0.2;
        p.effects.arpeggiator.active = true;
        p.effects.arpeggiator.rate = 8.0;
        p.effects.arpeggiator.pattern = smallvec![0, 4, 7, 12];
    }),
    ("dub_echo", |p| {
        p.oscillator.waveform = Waveform::Sine;
        p.filter.frequency = 700.0;
        p.filter.q = 3.0;
        p.envelope.attack = 0.01;
        p.envelope.release = 0.6;
        p.effects.delay.active = true;
        p.effects.delay.time = 0.5;
        p.effects.delay.feedback = 0.75;
    }),
];

/// Parameters for `name` (case-insensitive), or `None` if no such preset.
pub fn preset(name: &str) -> Option<EffectParameters> {
    let key = name.trim().to_ascii_lowercase();
    let (_, patch) = PRESETS.iter().find(|(n, _)| *n == key)?;
    let mut params = EffectParameters::default();
    patch(&mut params);
    Some(params)
}

/// Preset names in declaration order.
pub fn preset_names() -> Vec<String> {
    PRESETS.iter().map(|(n, _)| n.to_string()).collect()
}
