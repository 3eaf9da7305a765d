// Host-side tests for the synth engine against the recording audio backend.

mod support;

use hypercube_core::audio::{NodeId, ParamKind, RampCurve};
use hypercube_core::constants::{ARP_STOP_FADE_SEC, MIN_FADE_SEC};
use hypercube_core::synth::Readiness;
use hypercube_core::{AudioError, ParamValue, SynthEngine, VisualizerConfig};
use support::{AudioEvent, MockAudio};

const DESTINATION: NodeId = NodeId(0);

fn ready() -> SynthEngine<MockAudio> {
    let mut synth = SynthEngine::new(&VisualizerConfig::default());
    synth.attach(MockAudio::new()).unwrap();
    synth
}

fn audio(synth: &SynthEngine<MockAudio>) -> &MockAudio {
    synth.backend().unwrap()
}

fn step(synth: &mut SynthEngine<MockAudio>, seconds: f64) {
    synth.backend_mut().unwrap().advance(seconds);
    synth.pump();
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.05
}

/// The most recent ramp on `param` heading to `value`: (end, curve).
fn last_ramp(synth: &SynthEngine<MockAudio>, param: ParamKind, value: f32) -> (f64, RampCurve) {
    audio(synth)
        .events
        .iter()
        .rev()
        .find_map(|e| match e {
            AudioEvent::Ramp { param: p, value: v, end, curve, .. }
                if *p == param && (*v - value).abs() < 1e-4 =>
            {
                Some((*end, *curve))
            }
            _ => None,
        })
        .unwrap()
}

#[test]
fn levels_are_zero_until_ready_then_follow_the_spectrum() {
    let mut synth: SynthEngine<MockAudio> = SynthEngine::new(&VisualizerConfig::default());
    let levels = synth.get_levels();
    assert_eq!((levels.bass, levels.mid, levels.high), (0.0, 0.0, 0.0));

    synth.attach(MockAudio::new()).unwrap();
    let silent = synth.get_levels();
    assert_eq!((silent.bass, silent.mid, silent.high), (0.0, 0.0, 0.0));

    synth.backend_mut().unwrap().spectrum = vec![255; 1024];
    let loud = synth.get_levels();
    assert_eq!((loud.bass, loud.mid, loud.high), (1.0, 1.0, 1.0));
}

#[test]
fn last_note_frequency_is_reported() {
    let mut synth = ready();
    synth.start_note("A4");
    assert!(approx(synth.get_levels().frequency, 440.0));
}

#[test]
fn arpeggio_steps_cycle_the_pattern_on_the_audio_clock() {
    let mut synth = ready();
    synth.toggle_effect("arpeggiator", true);
    synth.start_note("A4");
    assert!(synth.is_sequencing());

    let mut heard = vec![audio(&synth).last_oscillator_frequency().unwrap()];
    for _ in 0..3 {
        step(&mut synth, 0.125);
        heard.push(audio(&synth).last_oscillator_frequency().unwrap());
    }
    let expected = [440.0, 554.37, 659.26, 440.0];
    for (got, want) in heard.iter().zip(expected) {
        assert!(approx(*got, want), "{got} vs {want}");
    }
}

#[test]
fn no_step_fires_before_it_is_due() {
    let mut synth = ready();
    synth.toggle_effect("arpeggiator", true);
    synth.start_note("A4");
    let created = audio(&synth).oscillators.len();
    step(&mut synth, 0.05);
    assert_eq!(audio(&synth).oscillators.len(), created);
}

#[test]
fn at_most_one_voice_reaches_the_output() {
    let mut synth = ready();
    synth.start_note("C4");
    synth.stop_note(true);
    synth.start_note("E4");
    assert_eq!(audio(&synth).oscillators_reaching(DESTINATION).len(), 1);

    synth.toggle_effect("arpeggiator", true);
    synth.stop_note(true);
    synth.start_note("G4");
    assert_eq!(audio(&synth).oscillators_reaching(DESTINATION).len(), 1);
    for _ in 0..5 {
        step(&mut synth, 0.125);
        assert!(audio(&synth).oscillators_reaching(DESTINATION).len() <= 1);
    }
}

#[test]
fn released_voice_is_cleaned_up_after_its_tail() {
    let mut synth = ready();
    synth.start_note("C4");
    synth.stop_note(true);
    assert_eq!(audio(&synth).live_oscillators().len(), 1);
    step(&mut synth, 0.3);
    assert_eq!(audio(&synth).live_oscillators().len(), 1, "still fading");
    step(&mut synth, 0.5);
    assert!(audio(&synth).live_oscillators().is_empty());
}

#[test]
fn toggling_arpeggiator_while_held_switches_without_a_gap() {
    let mut synth = ready();
    synth.start_note("A4");
    synth.toggle_effect("arpeggiator", true);
    assert!(synth.is_sequencing());
    assert_eq!(audio(&synth).oscillators_reaching(DESTINATION).len(), 1);

    synth.toggle_effect("arpeggiator", false);
    assert!(!synth.is_sequencing());
    assert_eq!(audio(&synth).oscillators_reaching(DESTINATION).len(), 1);
    assert!(approx(audio(&synth).last_oscillator_frequency().unwrap(), 440.0));
}

#[test]
fn delay_send_toggles_cleanly() {
    let mut synth = ready();
    synth.start_note("C4");
    let before = audio(&synth).edges.clone();

    synth.toggle_effect("delay", true);
    assert_eq!(audio(&synth).edges.len(), before.len() + 1);
    synth.toggle_effect("delay", true);
    synth.toggle_effect("delay", false);

    assert_eq!(audio(&synth).edges, before);
    assert_eq!(audio(&synth).duplicate_connects, 0);
}

#[test]
fn vaporwave_preset_reaches_the_live_graph() {
    let mut synth = ready();
    assert!(synth.apply_preset("vaporwave"));
    assert_eq!(synth.params().filter.frequency, 800.0);
    assert_eq!(synth.params().effects.reverb.wet, 0.7);
    assert!(audio(&synth).events.iter().any(|e| matches!(
        e,
        AudioEvent::Ramp { param: ParamKind::Gain, value, .. } if *value == 0.7
    )));

    assert!(!synth.apply_preset("no-such-preset"));
    assert_eq!(synth.params().filter.frequency, 800.0);
}

#[test]
fn pending_note_plays_once_audio_is_ready() {
    let mut synth: SynthEngine<MockAudio> = SynthEngine::new(&VisualizerConfig::default());
    synth.start_note("C4");
    assert_eq!(synth.readiness(), Readiness::Pending);

    synth.attach(MockAudio::new()).unwrap();
    assert_eq!(synth.readiness(), Readiness::Ready);
    let freq = audio(&synth).last_oscillator_frequency().unwrap();
    assert!(approx(freq, 261.63));
}

#[test]
fn stop_while_pending_cancels_the_queued_note() {
    let mut synth: SynthEngine<MockAudio> = SynthEngine::new(&VisualizerConfig::default());
    synth.start_note("C4");
    synth.stop_note(true);
    synth.attach(MockAudio::new()).unwrap();
    assert!(audio(&synth).oscillators.is_empty());
}

#[test]
fn rejected_parameters_leave_state_untouched() {
    let mut synth = ready();
    let before = synth.params().clone();
    assert!(synth.set_parameter("chorus", "depth", 0.5_f32).is_err());
    assert!(synth.set_parameter("filter", "frequency", "loud").is_err());
    assert!(synth
        .set_parameter("arpeggiator", "pattern", ParamValue::Pattern(vec![]))
        .is_err());
    synth.toggle_effect("flanger", true);
    assert_eq!(synth.params(), &before);
}

#[test]
fn absurd_reverb_decay_is_clamped_for_the_impulse() {
    let mut synth = ready();
    synth.set_parameter("reverb", "decay", 1.0e6_f32).unwrap();
    synth.set_parameter("reverb", "decay", -4.0_f32).unwrap();
    let impulses = &audio(&synth).impulses;
    let lengths: Vec<usize> = impulses.iter().map(|(_, _, len)| *len).collect();
    assert_eq!(&lengths[1..], &[480_000, 4_800]);
    assert!(impulses.iter().all(|(_, channels, _)| *channels == 2));
}

#[test]
fn master_volume_is_clamped() {
    let mut synth = ready();
    synth.set_master_volume(3.0);
    assert_eq!(synth.master_volume(), 1.0);
    synth.set_master_volume(f32::NAN);
    assert_eq!(synth.master_volume(), 1.0);
}

#[test]
fn failed_initialization_turns_notes_into_noops() {
    let mut synth: SynthEngine<MockAudio> = SynthEngine::new(&VisualizerConfig::default());
    synth.fail_initialization(&AudioError::Unsupported("no AudioContext".to_string()));
    assert_eq!(synth.readiness(), Readiness::Failed);
    synth.start_note("C4");
    synth.stop_note(false);
    assert!(synth.attach(MockAudio::new()).is_err());
    assert!(synth.backend().is_none());
}

#[test]
fn node_creation_failure_fails_the_gate() {
    let mut synth: SynthEngine<MockAudio> = SynthEngine::new(&VisualizerConfig::default());
    let mut backend = MockAudio::new();
    backend.fail_creation = true;
    assert!(synth.attach(backend).is_err());
    assert_eq!(synth.readiness(), Readiness::Failed);
}

#[test]
fn dispose_is_idempotent_and_silences_later_calls() {
    let mut synth = ready();
    synth.start_note("C4");
    synth.dispose();
    synth.dispose();
    assert!(synth.backend().is_none());
    synth.start_note("D4");
    synth.pump();
    assert_eq!(synth.get_levels().bass, 0.0);
}

#[test]
fn unknown_note_names_are_ignored() {
    let mut synth = ready();
    synth.start_note("H9");
    assert!(audio(&synth).oscillators.is_empty());
}

#[test]
fn new_note_while_sequencing_only_reseeds_the_base() {
    let mut synth = ready();
    synth.toggle_effect("arpeggiator", true);
    synth.start_note("A4");
    step(&mut synth, 0.125);
    let created = audio(&synth).oscillators.len();

    synth.start_note("C4");
    assert_eq!(audio(&synth).oscillators.len(), created, "no restart, no extra step");
    assert!(synth.is_sequencing());

    // Third step of [0, 4, 7] on the new base.
    step(&mut synth, 0.125);
    let freq = audio(&synth).last_oscillator_frequency().unwrap();
    assert!(approx(freq, 392.0), "{freq}");
}

#[test]
fn stopping_a_sequence_uses_the_short_fade_not_the_release() {
    let mut synth = ready();
    synth.set_parameter("envelope", "release", 3.0_f32).unwrap();
    synth.toggle_effect("arpeggiator", true);
    synth.start_note("A4");
    synth.stop_note(true);

    assert!(!synth.is_sequencing());
    let (end, _) = last_ramp(&synth, ParamKind::Gain, 0.0);
    assert!((end - ARP_STOP_FADE_SEC).abs() < 1e-9, "{end}");
}

#[test]
fn filter_frequency_glides_exponentially_and_the_rest_linearly() {
    let mut synth = ready();
    synth.start_note("C4");
    synth.set_parameter("filter", "frequency", 1200.0_f32).unwrap();
    synth.set_parameter("filter", "q", 5.0_f32).unwrap();
    synth.set_parameter("oscillator", "gain", 0.3_f32).unwrap();
    synth.set_parameter("delay", "time", 0.4_f32).unwrap();

    assert_eq!(last_ramp(&synth, ParamKind::Frequency, 1200.0).1, RampCurve::Exponential);
    assert_eq!(last_ramp(&synth, ParamKind::Q, 5.0).1, RampCurve::Linear);
    assert_eq!(last_ramp(&synth, ParamKind::Gain, 0.3).1, RampCurve::Linear);
    assert_eq!(last_ramp(&synth, ParamKind::DelayTime, 0.4).1, RampCurve::Linear);
}

#[test]
fn abrupt_stop_fades_briefly_then_stops_the_oscillator() {
    let mut synth = ready();
    synth.start_note("C4");
    synth.stop_note(false);

    let (end, curve) = last_ramp(&synth, ParamKind::Gain, 0.0);
    assert!((end - MIN_FADE_SEC).abs() < 1e-9, "{end}");
    assert_eq!(curve, RampCurve::Linear);

    let (osc, _) = *audio(&synth).oscillators.last().unwrap();
    let stopped = audio(&synth).nodes[&osc].stopped.unwrap();
    assert!(stopped > end, "oscillator stops at {stopped}, ramp ends at {end}");
}
