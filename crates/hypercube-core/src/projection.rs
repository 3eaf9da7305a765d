use glam::{Vec3, Vec4};

use crate::constants::*;
use crate::strategy::{RegistrationError, ShaderStrategy, StrategySet};

/// Runtime uniforms a projection reads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectionInputs {
    pub morph_factor: f32,
    pub audio_mid: f32,
    pub audio_high: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective { base_distance: f32 },
    Orthographic { blend_distance: f32 },
    Stereographic { pole_w: f32 },
}

impl Projection {
    pub fn perspective() -> Self {
        Projection::Perspective {
            base_distance: PERSPECTIVE_BASE_DISTANCE,
        }
    }

    pub fn orthographic() -> Self {
        Projection::Orthographic {
            blend_distance: PERSPECTIVE_BASE_DISTANCE,
        }
    }

    pub fn stereographic() -> Self {
        Projection::Stereographic {
            pole_w: STEREO_POLE_W,
        }
    }

    /// CPU twin of the emitted GLSL.
    pub fn project(&self, p: Vec4, inputs: &ProjectionInputs) -> Vec3 {
        match *self {
            Projection::Perspective { base_distance } => perspective(p, base_distance, inputs),
            Projection::Orthographic { blend_distance } => {
                let t = smoothstep(0.0, 1.0, inputs.morph_factor);
                let ortho = p.truncate();
                ortho.lerp(perspective(p, blend_distance, inputs), t)
            }
            Projection::Stereographic { pole_w } => {
                let pole = pole_w + inputs.audio_high * STEREO_HIGH_SPAN;
                let denom = pole - p.w;
                let xyz = p.truncate();
                let stereo = if denom.abs() < STEREO_EPSILON {
                    let len = xyz.length();
                    let dir = if len > 1e-6 { xyz / len } else { Vec3::Z };
                    dir * STEREO_FAR
                } else {
                    xyz / denom
                };
                let t = smoothstep(0.0, 1.0, inputs.morph_factor * STEREO_MORPH_SCALE);
                stereo.lerp(xyz, t)
            }
        }
    }
}

fn perspective(p: Vec4, base_distance: f32, inputs: &ProjectionInputs) -> Vec3 {
    let distance = base_distance
        * (1.0 + inputs.morph_factor * PERSPECTIVE_MORPH_SPAN
            - inputs.audio_mid * PERSPECTIVE_MID_SPAN);
    let denom = (distance + p.w).max(PERSPECTIVE_MIN_DENOM);
    p.truncate() * (distance / denom)
}

// Same definition as GLSL smoothstep.
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn perspective_glsl(fn_name: &str, base_distance: f32) -> String {
    format!(
        r#"vec3 {fn_name}(vec4 p) {{
    float distance = {base:.4} * (1.0 + u_morphFactor * {morph:.4} - u_audioMid * {mid:.4});
    float denom = max(distance + p.w, {min_denom:.4});
    return p.xyz * (distance / denom);
}}
"#,
        base = base_distance,
        morph = PERSPECTIVE_MORPH_SPAN,
        mid = PERSPECTIVE_MID_SPAN,
        min_denom = PERSPECTIVE_MIN_DENOM,
    )
}

impl ShaderStrategy for Projection {
    const ENTRY_POINT: &'static str = "vec3 project4Dto3D(vec4 p)";
    const KIND: &'static str = "projection";

    fn name(&self) -> &str {
        match self {
            Projection::Perspective { .. } => "perspective",
            Projection::Orthographic { .. } => "orthographic",
            Projection::Stereographic { .. } => "stereographic",
        }
    }

    fn code(&self) -> String {
        match *self {
            Projection::Perspective { base_distance } => {
                let mut src = perspective_glsl("perspectiveProject", base_distance);
                src.push_str(&format!(
                    "{} {{\n    return perspectiveProject(p);\n}}\n",
                    Self::ENTRY_POINT
                ));
                src
            }
            Projection::Orthographic { blend_distance } => {
                let mut src = perspective_glsl("orthoBlendTarget", blend_distance);
                src.push_str(&format!(
                    r#"{entry} {{
    float t = smoothstep(0.0, 1.0, u_morphFactor);
    return mix(p.xyz, orthoBlendTarget(p), t);
}}
"#,
                    entry = Self::ENTRY_POINT
                ));
                src
            }
            Projection::Stereographic { pole_w } => format!(
                r#"{entry} {{
    float pole = {pole:.4} + u_audioHigh * {high:.4};
    float denom = pole - p.w;
    vec3 stereo;
    if (abs(denom) < {eps:.6}) {{
        float len = length(p.xyz);
        vec3 dir = len > 0.000001 ? p.xyz / len : vec3(0.0, 0.0, 1.0);
        stereo = dir * {far:.1};
    }} else {{
        stereo = p.xyz / denom;
    }}
    float t = smoothstep(0.0, 1.0, u_morphFactor * {scale:.4});
    return mix(stereo, p.xyz, t);
}}
"#,
                entry = Self::ENTRY_POINT,
                pole = pole_w,
                high = STEREO_HIGH_SPAN,
                eps = STEREO_EPSILON,
                far = STEREO_FAR,
                scale = STEREO_MORPH_SCALE,
            ),
        }
    }
}

pub fn builtin_projections(
    default_name: &str,
) -> Result<StrategySet<Projection>, RegistrationError> {
    let mut set = StrategySet::new(default_name);
    set.register(Projection::perspective())?;
    set.register(Projection::orthographic())?;
    set.register(Projection::stereographic())?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glsl_bakes_construction_constants() {
        let code = Projection::Perspective { base_distance: 3.0 }.code();
        assert!(code.contains("3.0000 * (1.0 + u_morphFactor"));
        assert!(code.contains(Projection::ENTRY_POINT));
    }

    #[test]
    fn perspective_clamps_denominator() {
        let p = Vec4::new(1.0, 1.0, 1.0, -10.0);
        let out = Projection::perspective().project(p, &ProjectionInputs::default());
        assert!(out.is_finite());
        assert!((out.x - PERSPECTIVE_BASE_DISTANCE / PERSPECTIVE_MIN_DENOM).abs() < 1e-3);
    }
}
