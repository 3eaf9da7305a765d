use crate::strategy::{RegistrationError, ShaderStrategy, StrategySet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    Hypercube,
    Hypersphere,
    Hypertetrahedron,
    Duocylinder,
    KleinBottle,
    Fractal,
    Wave,
    Crystal,
}

impl Geometry {
    pub const ALL: [Geometry; 8] = [
        Geometry::Hypercube,
        Geometry::Hypersphere,
        Geometry::Hypertetrahedron,
        Geometry::Duocylinder,
        Geometry::KleinBottle,
        Geometry::Fractal,
        Geometry::Wave,
        Geometry::Crystal,
    ];

    fn body(&self) -> &'static str {
        match self {
            Geometry::Hypercube => {
                r#"    float t = u_time * u_rotationSpeed;
    float w = sin(length(p) * 3.0 + t) * 0.5 * (u_dimension - 3.0) * (1.0 + u_audioBass);
    vec4 p4 = rotateXW(t * 0.31) * rotateYW(t * 0.27) * rotateZW(t * 0.23) * vec4(p, w);
    vec3 q = project4Dto3D(p4);
    float density = u_gridDensity * 0.1 * u_universeModifier;
    float edges = latticeEdges(q, density, 0.03 + u_audioHigh * 0.02);
    float verts = latticeVertices(q, density, 0.08 + u_audioBass * 0.04);
    return max(edges, verts * (0.5 + u_morphFactor * 0.5));"#
            }
            Geometry::Hypersphere => {
                r#"    float t = u_time * u_rotationSpeed;
    float r = length(p);
    float w = cos(r * 2.0 - t) * (u_dimension - 3.0);
    vec4 p4 = rotateXW(t * 0.2) * rotateZW(t * 0.17) * vec4(p, w);
    vec3 q = project4Dto3D(p4);
    float shells = abs(fract(length(q) * u_gridDensity * 0.25 * u_universeModifier) - 0.5);
    float shell = 1.0 - smoothstep(0.0, 0.06 + u_audioBass * 0.05, shells);
    float grid = latticeEdges(q, u_gridDensity * 0.1, 0.025);
    return mix(shell, max(shell, grid), u_morphFactor) * (0.8 + u_audioMid * 0.4);"#
            }
            Geometry::Hypertetrahedron => {
                r#"    float t = u_time * u_rotationSpeed;
    float w = (p.x + p.y + p.z) * 0.33 * (u_dimension - 3.0);
    vec4 p4 = rotateXW(t * 0.29) * rotateYW(t * 0.21) * vec4(p, w);
    vec3 q = project4Dto3D(p4) * u_gridDensity * 0.1 * u_universeModifier;
    vec3 c = fract(q) - 0.5;
    float plane1 = abs(c.x + c.y + c.z);
    float plane2 = abs(c.x - c.y - c.z);
    float plane3 = abs(-c.x + c.y - c.z);
    float plane4 = abs(-c.x - c.y + c.z);
    float d = min(min(plane1, plane2), min(plane3, plane4));
    return (1.0 - smoothstep(0.0, 0.05 + u_audioHigh * 0.03, d)) * (0.6 + u_morphFactor * 0.4);"#
            }
            Geometry::Duocylinder => {
                r#"    float t = u_time * u_rotationSpeed;
    vec4 p4 = rotateXW(t * 0.25) * rotateYW(t * 0.19) * vec4(p, sin(t) * (u_dimension - 3.0));
    vec3 q = project4Dto3D(p4);
    float r1 = length(q.xy) - 0.8 - u_audioBass * 0.2;
    float r2 = length(vec2(q.z, p4.w)) - 0.6;
    float d = length(vec2(r1, r2)) - 0.1 * u_universeModifier;
    float rings = latticeEdges(q, u_gridDensity * 0.08, 0.02);
    return max(1.0 - smoothstep(0.0, 0.08, abs(d)), rings * u_morphFactor);"#
            }
            Geometry::KleinBottle => {
                r#"    float t = u_time * u_rotationSpeed;
    float u = atan(p.y, p.x) + t * 0.3;
    float v = length(p.xy) * 3.1416;
    vec4 k = vec4(
        (2.0 + cos(v)) * cos(u),
        (2.0 + cos(v)) * sin(u),
        sin(v) * cos(u * 0.5),
        sin(v) * sin(u * 0.5) * (u_dimension - 3.0)
    ) * 0.35;
    vec3 q = project4Dto3D(rotateZW(t * 0.2) * k);
    float d = length(q - p) - 0.05 - u_audioMid * 0.05;
    float surface = 1.0 - smoothstep(0.0, 0.15 * u_universeModifier, d);
    return max(surface, latticeEdges(q, u_gridDensity * 0.1, 0.02) * u_morphFactor);"#
            }
            Geometry::Fractal => {
                r#"    float t = u_time * u_rotationSpeed;
    vec4 z = rotateXW(t * 0.15) * vec4(p, (u_dimension - 3.0) * 0.5);
    float scale = 1.0;
    float trap = 10.0;
    for (int i = 0; i < 5; i++) {
        z = abs(z) * (1.6 + u_morphFactor * 0.4) - vec4(0.8, 0.8, 0.8, 0.4);
        scale *= 1.6 + u_morphFactor * 0.4;
        trap = min(trap, length(project4Dto3D(z)) / scale);
    }
    float density = u_gridDensity * 0.05 * u_universeModifier;
    float glow = 1.0 - smoothstep(0.0, 0.1 + u_audioBass * 0.1, trap * density);
    return glow * (0.7 + u_audioHigh * 0.3);"#
            }
            Geometry::Wave => {
                r#"    float t = u_time * u_rotationSpeed;
    float w = sin(p.x * 3.0 + t) * cos(p.y * 3.0 - t) * (u_dimension - 3.0);
    vec3 q = project4Dto3D(rotateYW(t * 0.3) * vec4(p, w));
    float freq = u_gridDensity * 0.5 * u_universeModifier;
    float wave = sin(q.x * freq + t * 2.0) * sin(q.y * freq - t)
        * sin(q.z * freq + u_audioBass * 3.0);
    float band = 1.0 - smoothstep(0.0, 0.2 + u_audioMid * 0.1, abs(wave));
    return mix(band, band * latticeEdges(q, u_gridDensity * 0.1, 0.05), u_morphFactor * 0.5);"#
            }
            Geometry::Crystal => {
                r#"    float t = u_time * u_rotationSpeed;
    vec4 p4 = rotateXW(t * 0.11) * rotateZW(t * 0.13) * vec4(p, (u_dimension - 3.0) * 0.7);
    vec3 q = project4Dto3D(p4) * u_gridDensity * 0.12 * u_universeModifier;
    vec3 c = abs(fract(q) - 0.5);
    float octa = (c.x + c.y + c.z) - 0.5;
    float facets = 1.0 - smoothstep(0.0, 0.04 + u_audioHigh * 0.04, abs(octa));
    float verts = latticeVertices(q / (u_gridDensity * 0.12), u_gridDensity * 0.12, 0.1);
    return max(facets, verts * u_morphFactor) * (0.8 + u_audioBass * 0.3);"#
            }
        }
    }
}

impl ShaderStrategy for Geometry {
    const ENTRY_POINT: &'static str = "float calculateLattice(vec3 p)";
    const KIND: &'static str = "geometry";

    fn name(&self) -> &str {
        match self {
            Geometry::Hypercube => "hypercube",
            Geometry::Hypersphere => "hypersphere",
            Geometry::Hypertetrahedron => "hypertetrahedron",
            Geometry::Duocylinder => "duocylinder",
            Geometry::KleinBottle => "kleinbottle",
            Geometry::Fractal => "fractal",
            Geometry::Wave => "wave",
            Geometry::Crystal => "crystal",
        }
    }

    fn code(&self) -> String {
        format!(
            "// geometry: {}\n{} {{\n{}\n}}\n",
            self.name(),
            Self::ENTRY_POINT,
            self.body()
        )
    }
}

/// Registry holding every built-in geometry.
pub fn builtin_geometries(default_name: &str) -> Result<StrategySet<Geometry>, RegistrationError> {
    let mut set = StrategySet::new(default_name);
    for g in Geometry::ALL {
        set.register(g)?;
    }
    Ok(set)
}
