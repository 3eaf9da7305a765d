pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod gl;
pub mod mapper;
pub mod projection;
pub mod render;
pub mod shader;
pub mod strategy;
pub mod synth;

pub use config::*;
pub use error::*;
pub use mapper::map_audio_to_visuals;
pub use render::{RenderEngine, UniformId, VisualState, VisualUpdate};
pub use shader::ShaderComposer;
pub use synth::{AnalysisLevels, EffectParameters, ParamValue, SynthEngine};
