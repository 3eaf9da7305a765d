//! Sound parameters plus band levels in, visual parameters out. Pure.

use crate::constants::{HIGH_DELAY_FEEDBACK, HIGH_REVERB_WET};
use crate::render::{AudioLevelsUpdate, VisualUpdate};
use crate::synth::{AnalysisLevels, EffectParameters};

pub fn map_audio_to_visuals(params: &EffectParameters, levels: &AnalysisLevels) -> VisualUpdate {
    let resonance = params.filter.q;
    let attack = params.envelope.attack;
    let release = params.envelope.release;
    let fx = &params.effects;
    let AnalysisLevels {
        bass, mid, high, ..
    } = *levels;

    let morph_factor =
        (0.1 + resonance / 15.0 * 0.6 + attack / 2.0 * 0.3 + mid * 0.2).clamp(0.0, 1.0);
    let glitch_intensity = if fx.glitch.active {
        (0.05 + high * 0.6 + resonance / 10.0 * 0.3).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let arp_spin = if fx.arpeggiator.active {
        fx.arpeggiator.rate * 0.04
    } else {
        0.0
    };
    let rotation_speed = (0.1 + mid * 0.5 + high * 0.3 + arp_spin).clamp(0.0, 2.0);
    let dimension = (3.0 + bass * 0.8 + release / 3.0 * 0.5).clamp(3.0, 4.0);
    let grid_density = (8.0 + bass * 8.0 - mid * 2.0).clamp(5.0, 20.0);

    let projection = if fx.delay.active && fx.delay.feedback > HIGH_DELAY_FEEDBACK {
        "stereographic"
    } else if fx.reverb.active && fx.reverb.wet > HIGH_REVERB_WET {
        "perspective"
    } else if fx.arpeggiator.active {
        "stereographic"
    } else {
        "orthographic"
    };

    VisualUpdate {
        projection: Some(projection.to_string()),
        dimension: Some(dimension),
        morph_factor: Some(morph_factor),
        rotation_speed: Some(rotation_speed),
        grid_density: Some(grid_density),
        glitch_intensity: Some(glitch_intensity),
        audio: Some(AudioLevelsUpdate {
            bass: Some(bass),
            mid: Some(mid),
            high: Some(high),
        }),
        current_note_freq: Some(levels.frequency),
        ..Default::default()
    }
}
