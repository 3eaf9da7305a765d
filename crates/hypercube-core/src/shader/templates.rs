// GLSL ES 1.00 sources the composer assembles programs from.

pub const PROJECTION_MARKER: &str = "//__PROJECTION_CODE_INJECTION_POINT__";
pub const GEOMETRY_MARKER: &str = "//__GEOMETRY_CODE_INJECTION_POINT__";

pub const BASE_VERTEX_NAME: &str = "base_vertex";
pub const BASE_TEMPLATE_NAME: &str = "base_fragment";
pub const EXPERIMENTAL_TEMPLATE_NAME: &str = "geometry_fragment";

pub const BASE_VERTEX_SHADER: &str = r#"attribute vec2 a_position;
varying vec2 v_uv;

void main() {
    v_uv = a_position * 0.5 + 0.5;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

const FRAGMENT_HEADER: &str = r#"precision highp float;

uniform vec2 u_resolution;
uniform float u_time;
uniform vec2 u_mouse;
uniform float u_dimension;
uniform float u_morphFactor;
uniform float u_rotationSpeed;
uniform float u_universeModifier;
uniform float u_gridDensity;
uniform float u_glitchIntensity;
uniform float u_plasmaSpeed;
uniform float u_plasmaScale;
uniform float u_moireIntensity;
uniform float u_moireScale;
uniform float u_audioBass;
uniform float u_audioMid;
uniform float u_audioHigh;
uniform float u_currentNoteFreq;
uniform vec3 u_primaryColor;
uniform vec3 u_secondaryColor;
uniform vec3 u_backgroundColor;

varying vec2 v_uv;

mat4 rotateXW(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(c, 0.0, 0.0, -s, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, s, 0.0, 0.0, c);
}

mat4 rotateYW(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(1.0, 0.0, 0.0, 0.0, 0.0, c, 0.0, -s, 0.0, 0.0, 1.0, 0.0, 0.0, s, 0.0, c);
}

mat4 rotateZW(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, c, -s, 0.0, 0.0, s, c);
}

float latticeEdges(vec3 p, float density, float width) {
    vec3 cell = fract(p * density);
    vec3 edge = min(cell, 1.0 - cell);
    float d = min(min(max(edge.x, edge.y), max(edge.y, edge.z)), max(edge.x, edge.z));
    return 1.0 - smoothstep(0.0, width, d);
}

float latticeVertices(vec3 p, float density, float radius) {
    vec3 v = abs(fract(p * density + 0.5) - 0.5);
    return 1.0 - smoothstep(0.0, radius, length(v));
}

"#;

const INLINE_LATTICE: &str = r#"
float sceneLattice(vec3 p) {
    float t = u_time * u_rotationSpeed;
    float w = sin(length(p) * 3.0 + t) * 0.5 * (u_dimension - 3.0) * (1.0 + u_audioBass);
    mat4 spin = rotateXW(t * 0.31) * rotateYW(t * 0.27 + u_audioMid * 0.5) * rotateZW(t * 0.23);
    vec4 p4 = spin * vec4(p, w);
    vec3 q = project4Dto3D(p4);
    float density = u_gridDensity * 0.1 * u_universeModifier;
    float edges = latticeEdges(q, density, 0.03 + u_audioHigh * 0.02);
    float verts = latticeVertices(q, density, 0.08 + u_audioBass * 0.04);
    return max(edges, verts * (0.5 + u_morphFactor * 0.5));
}
"#;

const GEOMETRY_LATTICE: &str = r#"
float sceneLattice(vec3 p) {
    return calculateLattice(p);
}
"#;

const FRAGMENT_SHADING: &str = r#"
float plasma(vec2 uv) {
    float t = u_time * u_plasmaSpeed;
    float v = sin(uv.x * u_plasmaScale + t)
        + sin(uv.y * u_plasmaScale * 0.8 - t * 1.3)
        + sin((uv.x + uv.y) * u_plasmaScale * 0.6 + t * 0.7);
    return v / 6.0 + 0.5;
}

float moire(vec2 uv) {
    float a = sin(length(uv - 0.2) * u_moireScale * 40.0);
    float b = sin(length(uv + 0.2) * u_moireScale * 41.0);
    return a * b * 0.5 + 0.5;
}

float glitchNoise(float row) {
    return fract(sin(row * 12.9898 + floor(u_time * 24.0) * 78.233) * 43758.5453);
}

void main() {
    vec2 uv = (gl_FragCoord.xy - 0.5 * u_resolution) / min(u_resolution.x, u_resolution.y);
    uv += (u_mouse - 0.5) * 0.3;

    float row = floor(v_uv.y * 48.0);
    float tear = step(1.0 - u_glitchIntensity * 0.5, glitchNoise(row));
    uv.x += tear * (glitchNoise(row + 7.0) - 0.5) * u_glitchIntensity * 0.2;

    vec3 p = vec3(uv * 2.0, sin(u_time * 0.2) * 0.5);
    float lattice = clamp(sceneLattice(p), 0.0, 1.0);

    float noteHue = fract(log2(max(u_currentNoteFreq, 1.0)));
    vec3 primary = mix(u_primaryColor, u_primaryColor.gbr, noteHue * 0.25);

    vec3 color = mix(u_backgroundColor, primary, lattice);
    color = mix(color, u_secondaryColor, plasma(uv) * 0.35 * (0.5 + u_audioMid));
    color += u_secondaryColor * moire(uv) * u_moireIntensity * 0.2;
    color += u_secondaryColor * u_audioHigh * 0.15 * lattice;

    float split = u_glitchIntensity * 0.02;
    color.r += clamp(sceneLattice(p + vec3(split, 0.0, 0.0)), 0.0, 1.0) * split * 10.0;

    gl_FragColor = vec4(color, 1.0);
}
"#;

/// Base template: inline lattice, projection spliced at [`PROJECTION_MARKER`].
pub fn base_fragment_template() -> String {
    [FRAGMENT_HEADER, PROJECTION_MARKER, INLINE_LATTICE, FRAGMENT_SHADING].concat()
}

/// Alternate template: geometry strategy spliced at [`GEOMETRY_MARKER`] after the projection.
pub fn experimental_fragment_template() -> String {
    [
        FRAGMENT_HEADER,
        PROJECTION_MARKER,
        "\n",
        GEOMETRY_MARKER,
        GEOMETRY_LATTICE,
        FRAGMENT_SHADING,
    ]
    .concat()
}
