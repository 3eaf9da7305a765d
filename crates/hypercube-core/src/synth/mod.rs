//! Synthesis engine: one voice slot, a persistent delay/reverb bus, an
//! arpeggio sequencer and a spectral analyser, all on an [`AudioBackend`].
//!
//! The engine starts `Pending` and only touches audio once a backend is
//! attached (after the first user gesture on the web). Note calls made while
//! pending are remembered; after a failed start they are ignored with a warning.
//!
//! There is never more than one live voice. Every new note or arpeggio step
//! cuts the slot first, so a releasing tail cannot overlap the next voice.

use smallvec::SmallVec;

use crate::audio::{AudioBackend, NodeId, ParamKind, RampCurve};
use crate::config::{BandShaping, VisualizerConfig};
use crate::constants::*;
use crate::error::{AudioError, ParamError};

pub mod analysis;
pub mod arpeggio;
pub mod notes;
pub mod params;
pub mod presets;
pub mod reverb;

pub use analysis::AnalysisLevels;
pub use params::{EffectParameters, ParamChange, ParamValue};

use arpeggio::{arpeggio_frequency, StepTimer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Long-lived nodes shared by every voice.
struct Bus {
    master: NodeId,
    analyser: NodeId,
    delay: NodeId,
    delay_feedback: NodeId,
    delay_wet: NodeId,
    convolver: NodeId,
    reverb_wet: NodeId,
}

impl Bus {
    fn nodes(&self) -> [NodeId; 7] {
        [
            self.master,
            self.analyser,
            self.delay,
            self.delay_feedback,
            self.delay_wet,
            self.convolver,
            self.reverb_wet,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Sustaining,
    /// Fading out; nodes are released once the audio clock passes `cleanup_at`.
    Releasing { cleanup_at: f64 },
    /// One arpeggio step, self-terminating at the end of its slice.
    Step { cleanup_at: f64 },
}

struct Voice {
    osc: NodeId,
    filter: NodeId,
    gain: NodeId,
    phase: Phase,
    to_delay: bool,
    to_reverb: bool,
}

#[derive(Default)]
struct ArpeggiatorState {
    timer: Option<StepTimer>,
    step: usize,
    base: f32,
}

pub struct SynthEngine<A: AudioBackend> {
    readiness: Readiness,
    backend: Option<A>,
    bus: Option<Bus>,
    params: EffectParameters,
    bands: [BandShaping; 3],
    fft_size: u32,
    master_volume: f32,
    voice: Option<Voice>,
    /// Frequency of the note currently held down.
    held: Option<f32>,
    pending_note: Option<String>,
    arp: ArpeggiatorState,
    last_frequency: f32,
    spectrum: Vec<u8>,
    disposed: bool,
}

impl<A: AudioBackend> SynthEngine<A> {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            readiness: Readiness::Pending,
            backend: None,
            bus: None,
            params: EffectParameters::default(),
            bands: config.bands,
            fft_size: config.analyser_fft_size,
            master_volume: config.master_volume.clamp(0.0, 1.0),
            voice: None,
            held: None,
            pending_note: None,
            arp: ArpeggiatorState::default(),
            last_frequency: 0.0,
            spectrum: Vec::new(),
            disposed: false,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    pub fn backend(&self) -> Option<&A> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut A> {
        self.backend.as_mut()
    }

    pub fn is_sequencing(&self) -> bool {
        self.arp.timer.is_some()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Resolve the readiness gate with a live backend and build the effects bus.
    /// A note requested while pending starts right away.
    pub fn attach(&mut self, mut backend: A) -> Result<(), AudioError> {
        if self.disposed || self.readiness != Readiness::Pending {
            log::warn!("[synth] attach ignored in state {:?}", self.readiness);
            backend.close();
            return Err(AudioError::Graph("engine is not awaiting a backend".to_string()));
        }
        match build_bus(&mut backend, &self.params, self.fft_size, self.master_volume) {
            Ok(bus) => {
                self.bus = Some(bus);
                self.backend = Some(backend);
                self.readiness = Readiness::Ready;
                log::info!("[synth] audio ready");
            }
            Err(e) => {
                backend.close();
                self.fail_initialization(&e);
                return Err(e);
            }
        }
        if let Some(name) = self.pending_note.take() {
            self.start_note(&name);
        }
        Ok(())
    }

    /// Resolve the readiness gate as failed; audio calls become warnings.
    pub fn fail_initialization(&mut self, error: &AudioError) {
        if self.readiness == Readiness::Pending {
            log::error!("[synth] audio unavailable: {}", error);
            self.readiness = Readiness::Failed;
        }
        self.pending_note = None;
    }

    pub fn start_note(&mut self, name: &str) {
        if self.disposed {
            return;
        }
        let Some(freq) = notes::note_frequency(name) else {
            log::warn!("[synth] unknown note '{}'", name);
            return;
        };
        match self.readiness {
            Readiness::Pending => {
                log::info!("[synth] '{}' queued until audio is ready", name);
                self.pending_note = Some(name.to_string());
                return;
            }
            Readiness::Failed => {
                log::warn!("[synth] '{}' ignored: audio failed to initialize", name);
                return;
            }
            Readiness::Ready => {}
        }

        self.held = Some(freq);
        if self.params.effects.arpeggiator.active {
            self.arp.base = freq;
            if self.arp.timer.is_none() {
                self.start_sequencer();
            }
        } else {
            self.cut_voice();
            self.start_sustained(freq);
        }
    }

    pub fn stop_note(&mut self, use_release: bool) {
        self.pending_note = None;
        if !self.is_ready() {
            return;
        }
        self.held = None;
        if self.arp.timer.is_some() {
            self.stop_sequencer(ARP_STOP_FADE_SEC);
            return;
        }
        let fade = if use_release {
            (self.params.envelope.release as f64).max(MIN_FADE_SEC)
        } else {
            MIN_FADE_SEC
        };
        if matches!(self.voice.as_ref().map(|v| v.phase), Some(Phase::Sustaining)) {
            self.release_voice(fade);
        }
    }

    /// Write `group.name`. Live nodes follow the new value through a short ramp.
    pub fn set_parameter(
        &mut self,
        group: &str,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ParamError> {
        let change = match self.params.set(group, name, &value.into()) {
            Ok(change) => change,
            Err(e) => {
                log::warn!("[synth] {}", e);
                return Err(e);
            }
        };
        if self.is_ready() {
            self.apply_live(change);
        }
        Ok(())
    }

    pub fn toggle_effect(&mut self, name: &str, active: bool) {
        let effect = name.trim().to_ascii_lowercase();
        if !matches!(
            effect.as_str(),
            "delay" | "reverb" | "arpeggiator" | "glitch"
        ) {
            log::warn!("[synth] unknown effect '{}'", name);
            return;
        }
        _ = self.set_parameter(&effect, "active", active);
    }

    /// Replace every parameter with the named preset. Unknown names are ignored.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        let Some(next) = presets::preset(name) else {
            log::warn!("[synth] unknown preset '{}'", name);
            return false;
        };
        let previous = std::mem::replace(&mut self.params, next);
        if self.is_ready() {
            for change in changes_between(&previous, &self.params) {
                self.apply_live(change);
            }
        }
        log::info!("[synth] preset '{}'", name);
        true
    }

    pub fn preset_names(&self) -> Vec<String> {
        presets::preset_names()
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.master_volume = volume.clamp(0.0, 1.0);
        if let (Some(backend), Some(bus)) = (self.backend.as_mut(), self.bus.as_ref()) {
            glide(
                backend,
                bus.master,
                ParamKind::Gain,
                self.master_volume,
                RampCurve::Linear,
            );
        }
    }

    /// Band levels for this instant; all zero until audio is ready.
    pub fn get_levels(&mut self) -> AnalysisLevels {
        let (Some(backend), Some(bus)) = (self.backend.as_mut(), self.bus.as_ref()) else {
            return AnalysisLevels::default();
        };
        let bins = backend.frequency_bin_count(bus.analyser);
        self.spectrum.resize(bins, 0);
        backend.byte_frequency_data(bus.analyser, &mut self.spectrum);
        let [bass, mid, high] =
            analysis::compute_band_levels(&self.spectrum, backend.sample_rate(), &self.bands);
        AnalysisLevels {
            bass,
            mid,
            high,
            frequency: self.last_frequency,
        }
    }

    /// Advance against the audio clock: fire a due arpeggio step, then release
    /// a finished voice. Called once per frame.
    pub fn pump(&mut self) {
        if !self.is_ready() {
            return;
        }
        let Some(now) = self.backend.as_ref().map(|b| b.current_time()) else {
            return;
        };
        if let Some(at) = self.arp.timer.as_mut().and_then(|t| t.poll(now)) {
            self.play_step(at);
        }
        let finished = match self.voice.as_ref().map(|v| v.phase) {
            Some(Phase::Releasing { cleanup_at }) | Some(Phase::Step { cleanup_at }) => {
                now >= cleanup_at
            }
            _ => false,
        };
        if finished {
            if let (Some(backend), Some(voice)) = (self.backend.as_mut(), self.voice.take()) {
                release_nodes(backend, &voice);
            }
        }
    }

    /// Tear down the graph and close the backend. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.arp.timer = None;
        self.pending_note = None;
        self.held = None;
        self.cut_voice();
        if let Some(mut backend) = self.backend.take() {
            if let Some(bus) = self.bus.take() {
                for node in bus.nodes() {
                    backend.release(node);
                }
            }
            backend.close();
        }
        log::info!("[synth] disposed");
    }

    fn now(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.current_time())
    }

    fn start_sustained(&mut self, freq: f32) {
        let start = self.now() + START_OFFSET_SEC;
        let attack = (self.params.envelope.attack as f64).max(0.0);
        let level = self.params.oscillator.gain;
        let Some(gain) = self.spawn_voice(freq, Phase::Sustaining, start) else {
            return;
        };
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        backend.set_param_at(gain, ParamKind::Gain, 0.0, start);
        backend.ramp_param(gain, ParamKind::Gain, level, start + attack, RampCurve::Linear);
    }

    /// Create, wire and start a voice in the slot. Returns its gain node.
    fn spawn_voice(&mut self, freq: f32, phase: Phase, start: f64) -> Option<NodeId> {
        let (Some(backend), Some(bus)) = (self.backend.as_mut(), self.bus.as_ref()) else {
            return None;
        };
        let mut voice = match create_voice(backend, &self.params, freq, bus.master) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("[synth] voice not created: {}", e);
                return None;
            }
        };
        voice.phase = phase;
        route_effects(backend, bus, &mut voice, &self.params);
        backend.start(voice.osc, start);
        self.last_frequency = freq;
        let gain = voice.gain;
        self.voice = Some(voice);
        Some(gain)
    }

    /// Silence and release the slot immediately, with no tail.
    fn cut_voice(&mut self) {
        let Some(voice) = self.voice.take() else {
            return;
        };
        if let Some(backend) = self.backend.as_mut() {
            let now = backend.current_time();
            backend.cancel_scheduled(voice.gain, ParamKind::Gain, now);
            backend.set_param_at(voice.gain, ParamKind::Gain, 0.0, now);
            backend.stop(voice.osc, now);
            release_nodes(backend, &voice);
        }
    }

    /// Fade the slot to silence over `fade` seconds, then stop and schedule cleanup.
    fn release_voice(&mut self, fade: f64) {
        let (Some(backend), Some(voice)) = (self.backend.as_mut(), self.voice.as_mut()) else {
            return;
        };
        let now = backend.current_time();
        let current = backend.param_value(voice.gain, ParamKind::Gain).unwrap_or(0.0);
        backend.cancel_scheduled(voice.gain, ParamKind::Gain, now);
        backend.set_param_at(voice.gain, ParamKind::Gain, current, now);
        let end = now + fade;
        backend.ramp_param(voice.gain, ParamKind::Gain, 0.0, end, RampCurve::Linear);
        let stop_at = end + STOP_MARGIN_SEC;
        backend.stop(voice.osc, stop_at);
        voice.phase = Phase::Releasing {
            cleanup_at: stop_at + CLEANUP_BUFFER_SEC,
        };
    }

    fn start_sequencer(&mut self) {
        self.cut_voice();
        self.arp.timer = None;
        self.arp.step = 0;
        let now = self.now();
        self.arp.timer = Some(StepTimer::new(self.params.effects.arpeggiator.rate, now));
        log::debug!("[synth] sequencer started at {:.1} Hz", self.arp.base);
        if let Some(at) = self.arp.timer.as_mut().and_then(|t| t.poll(now)) {
            self.play_step(at);
        }
    }

    fn stop_sequencer(&mut self, fade: f64) {
        if self.arp.timer.take().is_some() {
            log::debug!("[synth] sequencer stopped");
        }
        self.arp.step = 0;
        if self.voice.is_some() {
            self.release_voice(fade);
        }
    }

    fn sequencer_is_live(&self) -> bool {
        self.is_ready()
            && self.params.effects.arpeggiator.active
            && !self.params.effects.arpeggiator.pattern.is_empty()
            && self.arp.base.is_finite()
            && self.arp.base > 0.0
            && self.bus.is_some()
    }

    fn play_step(&mut self, at: f64) {
        if !self.sequencer_is_live() {
            log::warn!("[synth] arpeggio step fired after state changed; stopping sequencer");
            self.stop_sequencer(ARP_STOP_FADE_SEC);
            return;
        }
        let Some(interval) = self.arp.timer.map(|t| t.interval()) else {
            return;
        };
        let freq = arpeggio_frequency(
            self.arp.base,
            &self.params.effects.arpeggiator.pattern,
            self.arp.step,
        );
        self.arp.step = self.arp.step.wrapping_add(1);

        self.cut_voice();
        let end = at + interval;
        let cleanup_at = end + STOP_MARGIN_SEC + CLEANUP_BUFFER_SEC;
        let level = self.params.oscillator.gain;
        let Some(gain) = self.spawn_voice(freq, Phase::Step { cleanup_at }, at) else {
            return;
        };
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        backend.set_param_at(gain, ParamKind::Gain, 0.0, at);
        backend.ramp_param(
            gain,
            ParamKind::Gain,
            level,
            at + interval * ARP_ATTACK_FRACTION,
            RampCurve::Linear,
        );
        backend.set_param_at(gain, ParamKind::Gain, level, at + interval * ARP_HOLD_FRACTION);
        backend.ramp_param(gain, ParamKind::Gain, 0.0, end, RampCurve::Linear);
        if let Some(voice) = self.voice.as_ref() {
            backend.stop(voice.osc, end + STOP_MARGIN_SEC);
        }
    }

    fn set_arpeggiator(&mut self, active: bool) {
        if active {
            if let (Some(freq), None) = (self.held, self.arp.timer) {
                self.arp.base = freq;
                self.start_sequencer();
            }
        } else if self.arp.timer.is_some() {
            match self.held {
                Some(freq) => {
                    self.arp.timer = None;
                    self.arp.step = 0;
                    self.cut_voice();
                    self.start_sustained(freq);
                }
                None => self.stop_sequencer(ARP_STOP_FADE_SEC),
            }
        }
    }

    fn apply_live(&mut self, change: ParamChange) {
        if change == ParamChange::ArpeggiatorActive {
            self.set_arpeggiator(self.params.effects.arpeggiator.active);
            return;
        }
        let (Some(backend), Some(bus)) = (self.backend.as_mut(), self.bus.as_ref()) else {
            return;
        };
        let p = &self.params;
        let voice = self.voice.as_mut();
        match change {
            ParamChange::OscillatorType => {
                if let Some(v) = voice {
                    backend.set_oscillator_type(v.osc, p.oscillator.waveform);
                }
            }
            ParamChange::OscillatorGain => {
                if let Some(v) = voice.filter(|v| v.phase == Phase::Sustaining) {
                    glide(backend, v.gain, ParamKind::Gain, p.oscillator.gain, RampCurve::Linear);
                }
            }
            ParamChange::FilterType => {
                if let Some(v) = voice {
                    backend.set_filter_type(v.filter, p.filter.kind);
                }
            }
            ParamChange::FilterFrequency => {
                if let Some(v) = voice {
                    glide(
                        backend,
                        v.filter,
                        ParamKind::Frequency,
                        p.filter.frequency,
                        RampCurve::Exponential,
                    );
                }
            }
            ParamChange::FilterQ => {
                if let Some(v) = voice {
                    glide(backend, v.filter, ParamKind::Q, p.filter.q, RampCurve::Linear);
                }
            }
            ParamChange::DelayActive | ParamChange::ReverbActive => {
                if let Some(v) = voice {
                    route_effects(backend, bus, v, p);
                }
            }
            ParamChange::DelayTime => glide(
                backend,
                bus.delay,
                ParamKind::DelayTime,
                p.effects.delay.time,
                RampCurve::Linear,
            ),
            ParamChange::DelayFeedback => glide(
                backend,
                bus.delay_feedback,
                ParamKind::Gain,
                p.effects.delay.feedback,
                RampCurve::Linear,
            ),
            ParamChange::ReverbDecay => {
                let impulse =
                    reverb::generate_impulse(backend.sample_rate(), p.effects.reverb.decay);
                if let Err(e) = backend.set_impulse_response(bus.convolver, &impulse) {
                    log::warn!("[synth] reverb impulse not updated: {}", e);
                }
            }
            ParamChange::ReverbWet => glide(
                backend,
                bus.reverb_wet,
                ParamKind::Gain,
                p.effects.reverb.wet,
                RampCurve::Linear,
            ),
            ParamChange::ArpeggiatorRate => {
                if let Some(timer) = self.arp.timer.as_mut() {
                    timer.set_rate(p.effects.arpeggiator.rate);
                }
            }
            // Picked up by the next note or step.
            ParamChange::Envelope
            | ParamChange::ArpeggiatorPattern
            | ParamChange::GlitchActive
            | ParamChange::ArpeggiatorActive => {}
        }
    }
}

fn build_bus<A: AudioBackend>(
    backend: &mut A,
    params: &EffectParameters,
    fft_size: u32,
    master_volume: f32,
) -> Result<Bus, AudioError> {
    let master = backend.create_gain(master_volume)?;
    let analyser = backend.create_analyser(fft_size)?;
    backend.connect(master, analyser)?;
    let destination = backend.destination();
    backend.connect(analyser, destination)?;

    let delay = backend.create_delay(MAX_DELAY_SEC, params.effects.delay.time)?;
    let delay_feedback = backend.create_gain(params.effects.delay.feedback)?;
    let delay_wet = backend.create_gain(DELAY_WET_GAIN)?;
    backend.connect(delay, delay_feedback)?;
    backend.connect(delay_feedback, delay)?;
    backend.connect(delay, delay_wet)?;
    backend.connect(delay_wet, master)?;

    let convolver = backend.create_convolver()?;
    let impulse = reverb::generate_impulse(backend.sample_rate(), params.effects.reverb.decay);
    backend.set_impulse_response(convolver, &impulse)?;
    let reverb_wet = backend.create_gain(params.effects.reverb.wet)?;
    backend.connect(convolver, reverb_wet)?;
    backend.connect(reverb_wet, master)?;

    Ok(Bus {
        master,
        analyser,
        delay,
        delay_feedback,
        delay_wet,
        convolver,
        reverb_wet,
    })
}

/// osc -> filter -> gain -> master, gain starting silent.
fn create_voice<A: AudioBackend>(
    backend: &mut A,
    params: &EffectParameters,
    freq: f32,
    master: NodeId,
) -> Result<Voice, AudioError> {
    let osc = backend.create_oscillator(params.oscillator.waveform, freq)?;
    let filter = params.filter.clone();
    let filter = match backend.create_filter(filter.kind, filter.frequency, filter.q) {
        Ok(f) => f,
        Err(e) => {
            backend.release(osc);
            return Err(e);
        }
    };
    let gain = match backend.create_gain(0.0) {
        Ok(g) => g,
        Err(e) => {
            backend.release(osc);
            backend.release(filter);
            return Err(e);
        }
    };
    let voice = Voice {
        osc,
        filter,
        gain,
        phase: Phase::Sustaining,
        to_delay: false,
        to_reverb: false,
    };
    let wired = backend
        .connect(osc, filter)
        .and_then(|_| backend.connect(filter, gain))
        .and_then(|_| backend.connect(gain, master));
    if let Err(e) = wired {
        release_nodes(backend, &voice);
        return Err(e);
    }
    Ok(voice)
}

/// Bring the voice's effect sends in line with the `active` flags. Each send is
/// disconnected before it is (re)connected so edges are never duplicated.
fn route_effects<A: AudioBackend>(
    backend: &mut A,
    bus: &Bus,
    voice: &mut Voice,
    params: &EffectParameters,
) {
    let sends = [
        (bus.delay, params.effects.delay.active, &mut voice.to_delay),
        (bus.convolver, params.effects.reverb.active, &mut voice.to_reverb),
    ];
    for (target, active, connected) in sends {
        if *connected {
            _ = backend.disconnect(voice.gain, target);
            *connected = false;
        }
        if active {
            match backend.connect(voice.gain, target) {
                Ok(()) => *connected = true,
                Err(e) => log::warn!("[synth] effect send failed: {}", e),
            }
        }
    }
}

fn release_nodes<A: AudioBackend>(backend: &mut A, voice: &Voice) {
    backend.release(voice.gain);
    backend.release(voice.filter);
    backend.release(voice.osc);
}

/// Short glide from the current value to `target`, cancelling anything queued.
fn glide<A: AudioBackend>(
    backend: &mut A,
    node: NodeId,
    param: ParamKind,
    target: f32,
    curve: RampCurve,
) {
    let now = backend.current_time();
    let mut current = backend.param_value(node, param).unwrap_or(target);
    let mut target = target;
    if curve == RampCurve::Exponential {
        current = current.max(MIN_FILTER_HZ);
        target = target.max(MIN_FILTER_HZ);
    }
    backend.cancel_scheduled(node, param, now);
    backend.set_param_at(node, param, current, now);
    backend.ramp_param(node, param, target, now + PARAM_RAMP_SEC, curve);
}

/// Live-relevant differences between two parameter sets, in application order.
fn changes_between(old: &EffectParameters, new: &EffectParameters) -> SmallVec<[ParamChange; 16]> {
    let mut out = SmallVec::new();
    let (oe, ne) = (&old.effects, &new.effects);
    let checks = [
        (old.oscillator.waveform != new.oscillator.waveform, ParamChange::OscillatorType),
        (old.oscillator.gain != new.oscillator.gain, ParamChange::OscillatorGain),
        (old.filter.kind != new.filter.kind, ParamChange::FilterType),
        (old.filter.frequency != new.filter.frequency, ParamChange::FilterFrequency),
        (old.filter.q != new.filter.q, ParamChange::FilterQ),
        (oe.delay.time != ne.delay.time, ParamChange::DelayTime),
        (oe.delay.feedback != ne.delay.feedback, ParamChange::DelayFeedback),
        (oe.reverb.decay != ne.reverb.decay, ParamChange::ReverbDecay),
        (oe.reverb.wet != ne.reverb.wet, ParamChange::ReverbWet),
        (oe.delay.active != ne.delay.active, ParamChange::DelayActive),
        (oe.reverb.active != ne.reverb.active, ParamChange::ReverbActive),
        (oe.arpeggiator.rate != ne.arpeggiator.rate, ParamChange::ArpeggiatorRate),
        (oe.arpeggiator.active != ne.arpeggiator.active, ParamChange::ArpeggiatorActive),
    ];
    for (changed, change) in checks {
        if changed {
            out.push(change);
        }
    }
    out
}
