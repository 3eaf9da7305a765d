//! Nested sound parameter record and its `group.name` write path.

use smallvec::{smallvec, SmallVec};

use crate::audio::{FilterKind, Waveform};
use crate::constants::{ARP_MAX_RATE, ARP_MIN_RATE, MIN_FILTER_HZ};
use crate::error::ParamError;

pub type Pattern = SmallVec<[i32; 8]>;

#[derive(Clone, Debug, PartialEq)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    pub gain: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterParams {
    pub kind: FilterKind,
    pub frequency: f32,
    pub q: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub release: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DelayParams {
    pub active: bool,
    pub time: f32,
    pub feedback: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReverbParams {
    pub active: bool,
    pub decay: f32,
    pub wet: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArpeggiatorParams {
    pub active: bool,
    /// Steps per second.
    pub rate: f32,
    /// Cyclic semitone offsets from the held note.
    pub pattern: Pattern,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlitchParams {
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectsParams {
    pub delay: DelayParams,
    pub reverb: ReverbParams,
    pub arpeggiator: ArpeggiatorParams,
    pub glitch: GlitchParams,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectParameters {
    pub oscillator: OscillatorParams,
    pub filter: FilterParams,
    pub envelope: EnvelopeParams,
    pub effects: EffectsParams,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            oscillator: OscillatorParams {
                waveform: Waveform::Saw,
                gain: 0.5,
            },
            filter: FilterParams {
                kind: FilterKind::Lowpass,
                frequency: 1500.0,
                q: 1.0,
            },
            envelope: EnvelopeParams {
                attack: 0.05,
                release: 0.5,
            },
            effects: EffectsParams {
                delay: DelayParams {
                    active: false,
                    time: 0.3,
                    feedback: 0.4,
                },
                reverb: ReverbParams {
                    active: false,
                    decay: 2.0,
                    wet: 0.3,
                },
                arpeggiator: ArpeggiatorParams {
                    active: false,
                    rate: 8.0,
                    pattern: smallvec![0, 4, 7],
                },
                glitch: GlitchParams { active: false },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Flag(bool),
    Text(String),
    Pattern(Vec<i32>),
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<Vec<i32>> for ParamValue {
    fn from(v: Vec<i32>) -> Self {
        ParamValue::Pattern(v)
    }
}

/// Parameter groups addressable through `group.name`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamGroup {
    Oscillator,
    Filter,
    Envelope,
    Delay,
    Reverb,
    Arpeggiator,
    Glitch,
}

impl ParamGroup {
    /// Accepts both `delay` and `effects.delay` spellings.
    pub fn parse(group: &str) -> Option<Self> {
        let g = group.trim().to_ascii_lowercase();
        let g = g.strip_prefix("effects.").unwrap_or(g.as_str());
        match g {
            "oscillator" => Some(ParamGroup::Oscillator),
            "filter" => Some(ParamGroup::Filter),
            "envelope" => Some(ParamGroup::Envelope),
            "delay" => Some(ParamGroup::Delay),
            "reverb" => Some(ParamGroup::Reverb),
            "arpeggiator" => Some(ParamGroup::Arpeggiator),
            "glitch" => Some(ParamGroup::Glitch),
            _ => None,
        }
    }
}

/// What a successful write touched; the engine uses it to update live nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamChange {
    OscillatorType,
    OscillatorGain,
    FilterType,
    FilterFrequency,
    FilterQ,
    Envelope,
    DelayActive,
    DelayTime,
    DelayFeedback,
    ReverbActive,
    ReverbDecay,
    ReverbWet,
    ArpeggiatorActive,
    ArpeggiatorRate,
    ArpeggiatorPattern,
    GlitchActive,
}

impl EffectParameters {
    /// Write `group.name`; rejected writes leave every field untouched.
    pub fn set(
        &mut self,
        group: &str,
        name: &str,
        value: &ParamValue,
    ) -> Result<ParamChange, ParamError> {
        let parsed =
            ParamGroup::parse(group).ok_or_else(|| ParamError::UnknownGroup(group.to_string()))?;
        let key = name.trim().to_ascii_lowercase();
        let unknown = || ParamError::UnknownName {
            group: group.to_string(),
            name: name.to_string(),
        };
        let wrong = |expected: &'static str| ParamError::WrongType {
            group: group.to_string(),
            name: name.to_string(),
            expected,
        };
        let number = || match value {
            ParamValue::Number(v) if v.is_finite() => Ok(*v),
            _ => Err(wrong("a finite number")),
        };
        let flag = || match value {
            ParamValue::Flag(v) => Ok(*v),
            _ => Err(wrong("a boolean")),
        };

        match (parsed, key.as_str()) {
            (ParamGroup::Oscillator, "type" | "waveform") => {
                let w = match value {
                    ParamValue::Text(t) => t.parse::<Waveform>().map_err(|_| wrong("a waveform"))?,
                    _ => return Err(wrong("a waveform name")),
                };
                self.oscillator.waveform = w;
                Ok(ParamChange::OscillatorType)
            }
            (ParamGroup::Oscillator, "gain") => {
                self.oscillator.gain = number()?.clamp(0.0, 1.0);
                Ok(ParamChange::OscillatorGain)
            }
            (ParamGroup::Filter, "type") => {
                let k = match value {
                    ParamValue::Text(t) => {
                        t.parse::<FilterKind>().map_err(|_| wrong("a filter type"))?
                    }
                    _ => return Err(wrong("a filter type name")),
                };
                self.filter.kind = k;
                Ok(ParamChange::FilterType)
            }
            (ParamGroup::Filter, "frequency") => {
                self.filter.frequency = number()?.max(MIN_FILTER_HZ);
                Ok(ParamChange::FilterFrequency)
            }
            (ParamGroup::Filter, "q") => {
                self.filter.q = number()?.max(0.0001);
                Ok(ParamChange::FilterQ)
            }
            (ParamGroup::Envelope, "attack") => {
                self.envelope.attack = number()?.max(0.0);
                Ok(ParamChange::Envelope)
            }
            (ParamGroup::Envelope, "release") => {
                self.envelope.release = number()?.max(0.0);
                Ok(ParamChange::Envelope)
            }
            (ParamGroup::Delay, "active") => {
                self.effects.delay.active = flag()?;
                Ok(ParamChange::DelayActive)
            }
            (ParamGroup::Delay, "time") => {
                self.effects.delay.time = number()?.clamp(0.0, 5.0);
                Ok(ParamChange::DelayTime)
            }
            (ParamGroup::Delay, "feedback") => {
                self.effects.delay.feedback = number()?.clamp(0.0, 0.95);
                Ok(ParamChange::DelayFeedback)
            }
            (ParamGroup::Reverb, "active") => {
                self.effects.reverb.active = flag()?;
                Ok(ParamChange::ReverbActive)
            }
            (ParamGroup::Reverb, "decay") => {
                // Impulse generation clamps; keep the raw value here.
                self.effects.reverb.decay = number()?;
                Ok(ParamChange::ReverbDecay)
            }
            (ParamGroup::Reverb, "wet") => {
                self.effects.reverb.wet = number()?.clamp(0.0, 1.0);
                Ok(ParamChange::ReverbWet)
            }
            (ParamGroup::Arpeggiator, "active") => {
                self.effects.arpeggiator.active = flag()?;
                Ok(ParamChange::ArpeggiatorActive)
            }
            (ParamGroup::Arpeggiator, "rate") => {
                self.effects.arpeggiator.rate = number()?.clamp(ARP_MIN_RATE, ARP_MAX_RATE);
                Ok(ParamChange::ArpeggiatorRate)
            }
            (ParamGroup::Arpeggiator, "pattern") => match value {
                ParamValue::Pattern(p) if !p.is_empty() => {
                    self.effects.arpeggiator.pattern = p.iter().copied().collect();
                    Ok(ParamChange::ArpeggiatorPattern)
                }
                _ => Err(wrong("a non-empty semitone pattern")),
            },
            (ParamGroup::Glitch, "active") => {
                self.effects.glitch.active = flag()?;
                Ok(ParamChange::GlitchActive)
            }
            _ => Err(unknown()),
        }
    }

    /// Read back `group.name` in the same shape `set` accepts.
    pub fn get(&self, group: &str, name: &str) -> Option<ParamValue> {
        let key = name.trim().to_ascii_lowercase();
        let value = match (ParamGroup::parse(group)?, key.as_str()) {
            (ParamGroup::Oscillator, "type" | "waveform") => {
                ParamValue::Text(self.oscillator.waveform.to_string())
            }
            (ParamGroup::Oscillator, "gain") => ParamValue::Number(self.oscillator.gain),
            (ParamGroup::Filter, "type") => ParamValue::Text(self.filter.kind.to_string()),
            (ParamGroup::Filter, "frequency") => ParamValue::Number(self.filter.frequency),
            (ParamGroup::Filter, "q") => ParamValue::Number(self.filter.q),
            (ParamGroup::Envelope, "attack") => ParamValue::Number(self.envelope.attack),
            (ParamGroup::Envelope, "release") => ParamValue::Number(self.envelope.release),
            (ParamGroup::Delay, "active") => ParamValue::Flag(self.effects.delay.active),
            (ParamGroup::Delay, "time") => ParamValue::Number(self.effects.delay.time),
            (ParamGroup::Delay, "feedback") => ParamValue::Number(self.effects.delay.feedback),
            (ParamGroup::Reverb, "active") => ParamValue::Flag(self.effects.reverb.active),
            (ParamGroup::Reverb, "decay") => ParamValue::Number(self.effects.reverb.decay),
            (ParamGroup::Reverb, "wet") => ParamValue::Number(self.effects.reverb.wet),
            (ParamGroup::Arpeggiator, "active") => {
                ParamValue::Flag(self.effects.arpeggiator.active)
            }
            (ParamGroup::Arpeggiator, "rate") => ParamValue::Number(self.effects.arpeggiator.rate),
            (ParamGroup::Arpeggiator, "pattern") => {
                ParamValue::Pattern(self.effects.arpeggiator.pattern.to_vec())
            }
            (ParamGroup::Glitch, "active") => ParamValue::Flag(self.effects.glitch.active),
            _ => return None,
        };
        Some(value)
    }
}
