/// Which lattice logic ends up in the fragment program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LatticeSource {
    /// The base template's inline lattice; only the projection is injected.
    #[default]
    InlineTemplate,
    /// Alternate template that also injects the selected geometry strategy.
    GeometryStrategy,
}

/// Shape of one analysis band: Hz span plus the response curve applied to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandShaping {
    pub low_hz: f32,
    pub high_hz: f32,
    pub exponent: f32,
    pub gain: f32,
}

pub const DEFAULT_BANDS: [BandShaping; 3] = [
    BandShaping {
        low_hz: 0.0,
        high_hz: 250.0,
        exponent: 0.9,
        gain: 1.1,
    },
    BandShaping {
        low_hz: 251.0,
        high_hz: 2000.0,
        exponent: 1.1,
        gain: 1.3,
    },
    BandShaping {
        low_hz: 2001.0,
        high_hz: 6000.0,
        exponent: 1.3,
        gain: 1.6,
    },
];

#[derive(Clone, Debug)]
pub struct VisualizerConfig {
    pub program_name: String,
    pub default_geometry: String,
    pub default_projection: String,
    pub lattice_source: LatticeSource,
    pub clear_color: [f32; 4],
    pub analyser_fft_size: u32,
    pub master_volume: f32,
    pub bands: [BandShaping; 3],
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            program_name: "hypercube".to_string(),
            default_geometry: "hypercube".to_string(),
            default_projection: "perspective".to_string(),
            lattice_source: LatticeSource::InlineTemplate,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            analyser_fft_size: 2048,
            master_volume: 0.7,
            bands: DEFAULT_BANDS,
        }
    }
}
