use std::fmt;
use std::str::FromStr;

use crate::error::AudioError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Waveform {
    Sine,
    Square,
    #[default]
    Saw,
    Triangle,
}

impl FromStr for Waveform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "triangle" => Ok(Waveform::Triangle),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "sawtooth",
            Waveform::Triangle => "triangle",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

impl FromStr for FilterKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lowpass" => Ok(FilterKind::Lowpass),
            "highpass" => Ok(FilterKind::Highpass),
            "bandpass" => Ok(FilterKind::Bandpass),
            "notch" => Ok(FilterKind::Notch),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterKind::Lowpass => "lowpass",
            FilterKind::Highpass => "highpass",
            FilterKind::Bandpass => "bandpass",
            FilterKind::Notch => "notch",
        })
    }
}

/// Automatable parameters the engine touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Gain,
    Frequency,
    Q,
    DelayTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampCurve {
    Linear,
    Exponential,
}

/// Nodes are addressed by [`NodeId`]; times are seconds on the backend's audio clock.
pub trait AudioBackend {
    fn current_time(&self) -> f64;
    fn sample_rate(&self) -> f32;
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32)
        -> Result<NodeId, AudioError>;
    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32)
        -> Result<NodeId, AudioError>;
    fn create_gain(&mut self, value: f32) -> Result<NodeId, AudioError>;
    fn create_delay(&mut self, max_seconds: f64, time: f32) -> Result<NodeId, AudioError>;
    fn create_convolver(&mut self) -> Result<NodeId, AudioError>;
    fn create_analyser(&mut self, fft_size: u32) -> Result<NodeId, AudioError>;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError>;
    /// Remove a single edge; errors when the edge does not exist.
    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError>;
    /// Disconnect every outgoing edge and forget the node.
    fn release(&mut self, node: NodeId);

    fn set_oscillator_type(&mut self, node: NodeId, waveform: Waveform);
    fn set_filter_type(&mut self, node: NodeId, kind: FilterKind);

    fn param_value(&self, node: NodeId, param: ParamKind) -> Option<f32>;
    fn set_param_at(&mut self, node: NodeId, param: ParamKind, value: f32, when: f64);
    fn cancel_scheduled(&mut self, node: NodeId, param: ParamKind, from: f64);
    fn ramp_param(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        end_time: f64,
        curve: RampCurve,
    );

    fn start(&mut self, node: NodeId, when: f64);
    fn stop(&mut self, node: NodeId, when: f64);

    /// Install a multi-channel impulse response on a convolver.
    fn set_impulse_response(
        &mut self,
        node: NodeId,
        channels: &[Vec<f32>],
    ) -> Result<(), AudioError>;
    fn frequency_bin_count(&self, analyser: NodeId) -> usize;
    fn byte_frequency_data(&mut self, analyser: NodeId, out: &mut [u8]);

    fn close(&mut self);
}
