//! Program assembly: splice strategy fragments into a template, compile, link
//! and keep per-program location caches.
//!
//! Programs are cached by *program name*, not by the strategies they were built
//! from. Recomposing under an existing name deletes the old GPU program and
//! drops its location caches, so stale locations can never leak across a
//! rebuild. Compiled shader objects are cached separately, keyed by template
//! plus strategy names, and are reused across rebuilds.

use fnv::FnvHashMap;

use crate::error::ShaderError;
use crate::geometry::{builtin_geometries, Geometry};
use crate::gl::{GlBackend, ShaderStage};
use crate::projection::{builtin_projections, Projection};
use crate::strategy::{RegistrationError, ShaderStrategy, StrategySet};

pub mod templates;

use templates::*;

pub struct ProgramHandle<G: GlBackend> {
    program: G::Program,
    projection: String,
    geometry: Option<String>,
    uniforms: FnvHashMap<String, Option<G::UniformLocation>>,
    attributes: FnvHashMap<String, Option<u32>>,
}

impl<G: GlBackend> ProgramHandle<G> {
    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn geometry(&self) -> Option<&str> {
        self.geometry.as_deref()
    }
}

pub struct ShaderComposer<G: GlBackend> {
    geometries: StrategySet<Geometry>,
    projections: StrategySet<Projection>,
    base_template: String,
    experimental_template: String,
    vertex_shaders: FnvHashMap<String, G::Shader>,
    fragment_shaders: FnvHashMap<String, G::Shader>,
    programs: FnvHashMap<String, ProgramHandle<G>>,
    active: Option<String>,
}

impl<G: GlBackend> ShaderComposer<G> {
    pub fn new(geometries: StrategySet<Geometry>, projections: StrategySet<Projection>) -> Self {
        Self {
            geometries,
            projections,
            base_template: base_fragment_template(),
            experimental_template: experimental_fragment_template(),
            vertex_shaders: FnvHashMap::default(),
            fragment_shaders: FnvHashMap::default(),
            programs: FnvHashMap::default(),
            active: None,
        }
    }

    /// Composer preloaded with every built-in geometry and projection.
    pub fn with_builtins(
        default_geometry: &str,
        default_projection: &str,
    ) -> Result<Self, RegistrationError> {
        Ok(Self::new(
            builtin_geometries(default_geometry)?,
            builtin_projections(default_projection)?,
        ))
    }

    pub fn geometries(&self) -> &StrategySet<Geometry> {
        &self.geometries
    }

    pub fn projections(&self) -> &StrategySet<Projection> {
        &self.projections
    }

    /// Build (or rebuild) `program_name` from the base template and a projection.
    pub fn compose(
        &mut self,
        gl: &mut G,
        program_name: &str,
        projection_name: &str,
    ) -> Result<(), ShaderError> {
        self.compose_program(gl, program_name, None, projection_name)
    }

    /// Build `program_name` from the alternate template, which also splices in
    /// the named geometry strategy.
    pub fn compose_with_geometry(
        &mut self,
        gl: &mut G,
        program_name: &str,
        geometry_name: &str,
        projection_name: &str,
    ) -> Result<(), ShaderError> {
        self.compose_program(gl, program_name, Some(geometry_name), projection_name)
    }

    fn compose_program(
        &mut self,
        gl: &mut G,
        program_name: &str,
        geometry_name: Option<&str>,
        projection_name: &str,
    ) -> Result<(), ShaderError> {
        if gl.is_context_lost() {
            return Err(ShaderError::Unavailable);
        }
        self.ensure_vertex_shader(gl)?;

        let projection_key = self
            .projections
            .resolve(projection_name)
            .ok_or_else(|| ShaderError::MissingStrategy {
                kind: Projection::KIND,
                name: projection_name.to_string(),
            })?
            .to_string();
        let geometry_key = match geometry_name {
            Some(name) => Some(
                self.geometries
                    .resolve(name)
                    .ok_or_else(|| ShaderError::MissingStrategy {
                        kind: Geometry::KIND,
                        name: name.to_string(),
                    })?
                    .to_string(),
            ),
            None => None,
        };

        let fragment_key = match &geometry_key {
            Some(g) => format!("{EXPERIMENTAL_TEMPLATE_NAME}+{g}+{projection_key}"),
            None => format!("{BASE_TEMPLATE_NAME}+{projection_key}"),
        };
        if !self.fragment_shaders.contains_key(&fragment_key) {
            let source = self.fragment_source(&projection_key, geometry_key.as_deref());
            let shader = compile(gl, ShaderStage::Fragment, &source)?;
            self.fragment_shaders.insert(fragment_key.clone(), shader);
        }

        let (Some(vertex), Some(fragment)) = (
            self.vertex_shaders.get(BASE_VERTEX_NAME),
            self.fragment_shaders.get(&fragment_key),
        ) else {
            return Err(ShaderError::Unavailable);
        };
        let program = gl.link_program(vertex, fragment).map_err(|log| {
            log::error!("[shader] link failed for '{}': {}", program_name, log);
            ShaderError::Link { log }
        })?;

        let handle = ProgramHandle {
            program,
            projection: projection_key,
            geometry: geometry_key,
            uniforms: FnvHashMap::default(),
            attributes: FnvHashMap::default(),
        };
        if let Some(old) = self.programs.insert(program_name.to_string(), handle) {
            gl.delete_program(&old.program);
            if self.active.as_deref() == Some(program_name) {
                self.active = None;
            }
        }
        log::info!(
            "[shader] built '{}' ({})",
            program_name,
            fragment_key
        );
        Ok(())
    }

    fn ensure_vertex_shader(&mut self, gl: &mut G) -> Result<(), ShaderError> {
        if !self.vertex_shaders.contains_key(BASE_VERTEX_NAME) {
            let shader = compile(gl, ShaderStage::Vertex, BASE_VERTEX_SHADER)?;
            self.vertex_shaders.insert(BASE_VERTEX_NAME.to_string(), shader);
        }
        Ok(())
    }

    fn fragment_source(&self, projection_key: &str, geometry_key: Option<&str>) -> String {
        let projection_code = self.projections.get_code(projection_key).unwrap_or_default();
        match geometry_key {
            Some(g) => {
                let geometry_code = self.geometries.get_code(g).unwrap_or_default();
                self.experimental_template
                    .replacen(PROJECTION_MARKER, projection_code, 1)
                    .replacen(GEOMETRY_MARKER, geometry_code, 1)
            }
            None => self
                .base_template
                .replacen(PROJECTION_MARKER, projection_code, 1),
        }
    }

    /// Activate a cached program. Returns `false` (and logs) for unknown names.
    pub fn use_program(&mut self, gl: &mut G, program_name: &str) -> bool {
        if self.active.as_deref() == Some(program_name) {
            return true;
        }
        match self.programs.get(program_name) {
            Some(handle) => {
                gl.use_program(&handle.program);
                self.active = Some(program_name.to_string());
                true
            }
            None => {
                log::warn!("[shader] use of unknown program '{}'", program_name);
                false
            }
        }
    }

    pub fn active_program(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn program(&self, program_name: &str) -> Option<&ProgramHandle<G>> {
        self.programs.get(program_name)
    }

    /// Location of `name` in the active program; `None` when absent or nothing is active.
    pub fn uniform_location(&mut self, gl: &mut G, name: &str) -> Option<G::UniformLocation> {
        let active = self.active.as_deref()?;
        let ProgramHandle {
            program, uniforms, ..
        } = self.programs.get_mut(active)?;
        if let Some(cached) = uniforms.get(name) {
            return cached.clone();
        }
        let loc = gl.uniform_location(program, name);
        uniforms.insert(name.to_string(), loc.clone());
        loc
    }

    pub fn attribute_location(&mut self, gl: &mut G, name: &str) -> Option<u32> {
        let active = self.active.as_deref()?;
        let ProgramHandle {
            program,
            attributes,
            ..
        } = self.programs.get_mut(active)?;
        *attributes
            .entry(name.to_string())
            .or_insert_with(|| gl.attribute_location(program, name))
    }

    /// Release every shader and program. Skips GPU calls once the context is gone.
    pub fn dispose(&mut self, gl: &mut G) {
        if gl.is_context_lost() {
            self.abandon();
            return;
        }
        for (_, handle) in self.programs.drain() {
            gl.delete_program(&handle.program);
        }
        for (_, shader) in self
            .vertex_shaders
            .drain()
            .chain(self.fragment_shaders.drain())
        {
            gl.delete_shader(&shader);
        }
        self.active = None;
    }

    /// Forget every handle without touching the GPU. For a context known to be lost.
    pub fn abandon(&mut self) {
        self.programs.clear();
        self.vertex_shaders.clear();
        self.fragment_shaders.clear();
        self.active = None;
    }
}

fn compile<G: GlBackend>(
    gl: &mut G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, ShaderError> {
    gl.compile_shader(stage, source).map_err(|log| {
        let annotated = annotate_compile_error(source, &log);
        match &annotated {
            Some(excerpt) => {
                log::error!("[shader] {} compile failed: {}\n{}", stage, log, excerpt)
            }
            None => log::error!("[shader] {} compile failed: {}", stage, log),
        }
        ShaderError::Compile {
            stage,
            log,
            annotated,
        }
    })
}

/// Source excerpt around the first `ERROR: <file>:<line>:` in a driver log,
/// with the offending line prefixed by `>>`.
pub fn annotate_compile_error(source: &str, log: &str) -> Option<String> {
    let rest = &log[log.find("ERROR:")? + "ERROR:".len()..];
    let mut parts = rest.trim_start().split(':');
    let _file = parts.next()?;
    let line: usize = parts.next()?.trim().parse().ok()?;
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return None;
    }
    let first = line.saturating_sub(2).max(1);
    let last = (line + 2).min(lines.len());
    let excerpt = (first..=last)
        .map(|n| {
            let marker = if n == line { ">>" } else { "  " };
            format!("{marker}{n:>5} | {}", lines[n - 1])
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(excerpt)
}
