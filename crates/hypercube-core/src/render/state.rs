//! Visual parameter state and its dirty-uniform bookkeeping.
//!
//! Every uniform is in exactly one of two states: dirty (must be uploaded
//! before the next draw) or clean. Effective changes make a uniform dirty; a
//! successful upload makes it clean; a program rebuild or (re)start makes all
//! of them dirty again.

use crate::config::VisualizerConfig;
use crate::gl::UniformValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformId {
    Time,
    Resolution,
    Mouse,
    Dimension,
    MorphFactor,
    RotationSpeed,
    UniverseModifier,
    GridDensity,
    GlitchIntensity,
    PlasmaSpeed,
    PlasmaScale,
    MoireIntensity,
    MoireScale,
    AudioBass,
    AudioMid,
    AudioHigh,
    CurrentNoteFreq,
    PrimaryColor,
    SecondaryColor,
    BackgroundColor,
}

impl UniformId {
    pub const ALL: [UniformId; 20] = [
        UniformId::Time,
        UniformId::Resolution,
        UniformId::Mouse,
        UniformId::Dimension,
        UniformId::MorphFactor,
        UniformId::RotationSpeed,
        UniformId::UniverseModifier,
        UniformId::GridDensity,
        UniformId::GlitchIntensity,
        UniformId::PlasmaSpeed,
        UniformId::PlasmaScale,
        UniformId::MoireIntensity,
        UniformId::MoireScale,
        UniformId::AudioBass,
        UniformId::AudioMid,
        UniformId::AudioHigh,
        UniformId::CurrentNoteFreq,
        UniformId::PrimaryColor,
        UniformId::SecondaryColor,
        UniformId::BackgroundColor,
    ];

    /// GLSL identifier of the uniform.
    pub fn name(self) -> &'static str {
        match self {
            UniformId::Time => "u_time",
            UniformId::Resolution => "u_resolution",
            UniformId::Mouse => "u_mouse",
            UniformId::Dimension => "u_dimension",
            UniformId::MorphFactor => "u_morphFactor",
            UniformId::RotationSpeed => "u_rotationSpeed",
            UniformId::UniverseModifier => "u_universeModifier",
            UniformId::GridDensity => "u_gridDensity",
            UniformId::GlitchIntensity => "u_glitchIntensity",
            UniformId::PlasmaSpeed => "u_plasmaSpeed",
            UniformId::PlasmaScale => "u_plasmaScale",
            UniformId::MoireIntensity => "u_moireIntensity",
            UniformId::MoireScale => "u_moireScale",
            UniformId::AudioBass => "u_audioBass",
            UniformId::AudioMid => "u_audioMid",
            UniformId::AudioHigh => "u_audioHigh",
            UniformId::CurrentNoteFreq => "u_currentNoteFreq",
            UniformId::PrimaryColor => "u_primaryColor",
            UniformId::SecondaryColor => "u_secondaryColor",
            UniformId::BackgroundColor => "u_backgroundColor",
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyUniforms(u32);

impl DirtyUniforms {
    pub fn mark(&mut self, id: UniformId) {
        self.0 |= id.bit();
    }

    pub fn mark_all(&mut self) {
        for id in UniformId::ALL {
            self.mark(id);
        }
    }

    pub fn clear(&mut self, id: UniformId) {
        self.0 &= !id.bit();
    }

    pub fn clear_all(&mut self) {
        self.0 = 0;
    }

    pub fn contains(&self, id: UniformId) -> bool {
        self.0 & id.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = UniformId> {
        UniformId::ALL.into_iter().filter(move |id| self.contains(*id))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorScheme {
    pub primary: [f32; 3],
    pub secondary: [f32; 3],
    pub background: [f32; 3],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: [1.0, 0.2, 0.8],
            secondary: [0.2, 1.0, 1.0],
            background: [0.05, 0.0, 0.2],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    pub time: f32,
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub geometry: String,
    pub projection: String,
    pub dimension: f32,
    pub morph_factor: f32,
    pub rotation_speed: f32,
    pub universe_modifier: f32,
    pub grid_density: f32,
    pub glitch_intensity: f32,
    pub plasma_speed: f32,
    pub plasma_scale: f32,
    pub moire_intensity: f32,
    pub moire_scale: f32,
    pub audio: AudioBands,
    pub current_note_freq: f32,
    pub colors: ColorScheme,
    pub dirty: DirtyUniforms,
    pub needs_rebuild: bool,
}

impl VisualState {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            time: 0.0,
            resolution: [0.0, 0.0],
            mouse: [0.5, 0.5],
            geometry: config.default_geometry.to_ascii_lowercase(),
            projection: config.default_projection.to_ascii_lowercase(),
            dimension: 3.5,
            morph_factor: 0.5,
            rotation_speed: 0.5,
            universe_modifier: 1.0,
            grid_density: 8.0,
            glitch_intensity: 0.0,
            plasma_speed: 0.5,
            plasma_scale: 1.0,
            moire_intensity: 0.0,
            moire_scale: 1.0,
            audio: AudioBands::default(),
            current_note_freq: 0.0,
            colors: ColorScheme::default(),
            dirty: DirtyUniforms::default(),
            needs_rebuild: true,
        }
    }

    pub fn uniform_value(&self, id: UniformId) -> UniformValue {
        match id {
            UniformId::Time => UniformValue::Float(self.time),
            UniformId::Resolution => UniformValue::Vec2(self.resolution),
            UniformId::Mouse => UniformValue::Vec2(self.mouse),
            UniformId::Dimension => UniformValue::Float(self.dimension),
            UniformId::MorphFactor => UniformValue::Float(self.morph_factor),
            UniformId::RotationSpeed => UniformValue::Float(self.rotation_speed),
            UniformId::UniverseModifier => UniformValue::Float(self.universe_modifier),
            UniformId::GridDensity => UniformValue::Float(self.grid_density),
            UniformId::GlitchIntensity => UniformValue::Float(self.glitch_intensity),
            UniformId::PlasmaSpeed => UniformValue::Float(self.plasma_speed),
            UniformId::PlasmaScale => UniformValue::Float(self.plasma_scale),
            UniformId::MoireIntensity => UniformValue::Float(self.moire_intensity),
            UniformId::MoireScale => UniformValue::Float(self.moire_scale),
            UniformId::AudioBass => UniformValue::Float(self.audio.bass),
            UniformId::AudioMid => UniformValue::Float(self.audio.mid),
            UniformId::AudioHigh => UniformValue::Float(self.audio.high),
            UniformId::CurrentNoteFreq => UniformValue::Float(self.current_note_freq),
            UniformId::PrimaryColor => UniformValue::Vec3(self.colors.primary),
            UniformId::SecondaryColor => UniformValue::Vec3(self.colors.secondary),
            UniformId::BackgroundColor => UniformValue::Vec3(self.colors.background),
        }
    }

    /// Merge `update`, marking each effectively changed uniform dirty.
    pub fn apply(&mut self, update: &VisualUpdate) {
        let dirty = &mut self.dirty;
        if let Some(name) = &update.geometry {
            let name = name.trim().to_ascii_lowercase();
            if name != self.geometry {
                self.geometry = name;
                self.needs_rebuild = true;
            }
        }
        if let Some(name) = &update.projection {
            let name = name.trim().to_ascii_lowercase();
            if name != self.projection {
                self.projection = name;
                self.needs_rebuild = true;
            }
        }
        if let Some(m) = update.mouse {
            merge_array(&mut self.mouse, m, UniformId::Mouse, dirty);
        }
        let dimension = update.dimension.map(|v| v.clamp(3.0, 4.0));
        let morph_factor = update.morph_factor.map(|v| v.clamp(0.0, 1.0));
        let scalars = [
            (dimension, &mut self.dimension, UniformId::Dimension),
            (morph_factor, &mut self.morph_factor, UniformId::MorphFactor),
            (update.rotation_speed, &mut self.rotation_speed, UniformId::RotationSpeed),
            (update.universe_modifier, &mut self.universe_modifier, UniformId::UniverseModifier),
            (update.grid_density, &mut self.grid_density, UniformId::GridDensity),
            (update.glitch_intensity, &mut self.glitch_intensity, UniformId::GlitchIntensity),
            (update.plasma_speed, &mut self.plasma_speed, UniformId::PlasmaSpeed),
            (update.plasma_scale, &mut self.plasma_scale, UniformId::PlasmaScale),
            (update.moire_intensity, &mut self.moire_intensity, UniformId::MoireIntensity),
            (update.moire_scale, &mut self.moire_scale, UniformId::MoireScale),
            (update.current_note_freq, &mut self.current_note_freq, UniformId::CurrentNoteFreq),
        ];
        for (value, field, id) in scalars {
            if let Some(v) = value {
                merge_scalar(field, v, id, dirty);
            }
        }
        if let Some(audio) = &update.audio {
            let bands = [
                (audio.bass, &mut self.audio.bass, UniformId::AudioBass),
                (audio.mid, &mut self.audio.mid, UniformId::AudioMid),
                (audio.high, &mut self.audio.high, UniformId::AudioHigh),
            ];
            for (value, field, id) in bands {
                if let Some(v) = value {
                    merge_scalar(field, v, id, dirty);
                }
            }
        }
        if let Some(colors) = &update.colors {
            let slots = [
                (colors.primary, &mut self.colors.primary, UniformId::PrimaryColor),
                (colors.secondary, &mut self.colors.secondary, UniformId::SecondaryColor),
                (colors.background, &mut self.colors.background, UniformId::BackgroundColor),
            ];
            for (value, field, id) in slots {
                if let Some(v) = value {
                    merge_array(field, v, id, dirty);
                }
            }
        }
    }
}

fn merge_scalar(field: &mut f32, value: f32, id: UniformId, dirty: &mut DirtyUniforms) {
    if value.is_finite() && *field != value {
        *field = value;
        dirty.mark(id);
    }
}

fn merge_array<const N: usize>(
    field: &mut [f32; N],
    value: [f32; N],
    id: UniformId,
    dirty: &mut DirtyUniforms,
) {
    if value.iter().all(|v| v.is_finite()) && *field != value {
        *field = value;
        dirty.mark(id);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorSchemeUpdate {
    pub primary: Option<[f32; 3]>,
    pub secondary: Option<[f32; 3]>,
    pub background: Option<[f32; 3]>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioLevelsUpdate {
    pub bass: Option<f32>,
    pub mid: Option<f32>,
    pub high: Option<f32>,
}

/// Partial visual state; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualUpdate {
    pub geometry: Option<String>,
    pub projection: Option<String>,
    pub mouse: Option<[f32; 2]>,
    pub dimension: Option<f32>,
    pub morph_factor: Option<f32>,
    pub rotation_speed: Option<f32>,
    pub universe_modifier: Option<f32>,
    pub grid_density: Option<f32>,
    pub glitch_intensity: Option<f32>,
    pub plasma_speed: Option<f32>,
    pub plasma_scale: Option<f32>,
    pub moire_intensity: Option<f32>,
    pub moire_scale: Option<f32>,
    pub audio: Option<AudioLevelsUpdate>,
    pub current_note_freq: Option<f32>,
    pub colors: Option<ColorSchemeUpdate>,
}
