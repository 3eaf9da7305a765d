// Shared tuning constants for the synth, renderer and mapper.

// Note envelope timing (seconds)
pub const MIN_FADE_SEC: f64 = 0.015; // fade used when a note stops without its release
pub const ARP_STOP_FADE_SEC: f64 = 0.03; // fade for the in-flight step when sequencing stops
pub const STOP_MARGIN_SEC: f64 = 0.02; // oscillator stop lands this far past the ramp end
pub const CLEANUP_BUFFER_SEC: f64 = 0.1; // nodes are released this long after their stop time
pub const PARAM_RAMP_SEC: f64 = 0.05; // live parameter changes glide over this window
pub const START_OFFSET_SEC: f64 = 0.005; // scheduling headroom for new voices

// Arpeggiator step shape as fractions of the step interval
pub const ARP_ATTACK_FRACTION: f64 = 0.1;
pub const ARP_HOLD_FRACTION: f64 = 0.8;
pub const ARP_MIN_RATE: f32 = 0.5;
pub const ARP_MAX_RATE: f32 = 32.0;

// Audio graph
pub const MAX_DELAY_SEC: f64 = 5.0;
pub const MIN_FILTER_HZ: f32 = 10.0; // exponential ramps cannot target zero
pub const ANALYSER_SMOOTHING: f64 = 0.8;
pub const DELAY_WET_GAIN: f32 = 0.5; // echoes sit under the dry voice

// Reverb impulse generation
pub const MIN_REVERB_DECAY_SEC: f32 = 0.1;
pub const MAX_REVERB_DECAY_SEC: f32 = 10.0;
pub const REVERB_DECAY_DB: f32 = 60.0; // attenuation reached at the end of the tail
pub const REVERB_SEED: u64 = 0x1234_ABCD;

// Mapper thresholds for projection selection
pub const HIGH_DELAY_FEEDBACK: f32 = 0.6;
pub const HIGH_REVERB_WET: f32 = 0.5;

// Projection shaping
pub const PERSPECTIVE_BASE_DISTANCE: f32 = 2.5;
pub const PERSPECTIVE_MORPH_SPAN: f32 = 0.4;
pub const PERSPECTIVE_MID_SPAN: f32 = 0.35;
pub const PERSPECTIVE_MIN_DENOM: f32 = 0.1;
pub const STEREO_POLE_W: f32 = 1.0;
pub const STEREO_HIGH_SPAN: f32 = 0.2;
pub const STEREO_EPSILON: f32 = 1e-4;
pub const STEREO_FAR: f32 = 1000.0; // magnitude standing in for the point at infinity
pub const STEREO_MORPH_SCALE: f32 = 0.8;

// Geometry/quad layout
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];
pub const POSITION_ATTRIBUTE: &str = "a_position";
