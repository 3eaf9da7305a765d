use instant::Instant;

use crate::config::{LatticeSource, VisualizerConfig};
use crate::constants::{POSITION_ATTRIBUTE, QUAD_VERTICES};
use crate::error::{ShaderError, VisualizerError};
use crate::gl::GlBackend;
use crate::shader::ShaderComposer;

mod state;

pub use state::*;

pub type ErrorCallback = Box<dyn FnMut(&VisualizerError)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was drawn.
    Drawn,
    /// The loop is not running; nothing was touched.
    Stopped,
    /// An unrecoverable error stopped the loop during this frame.
    Halted,
}

pub struct RenderEngine<G: GlBackend> {
    gl: G,
    composer: ShaderComposer<G>,
    config: VisualizerConfig,
    state: VisualState,
    quad: Option<G::Buffer>,
    running: bool,
    started_at: Instant,
    on_error: Option<ErrorCallback>,
    error_reported: bool,
    context_lost: bool,
    disposed: bool,
    // Uniforms already warned about as unresolved since the last rebuild.
    unresolved_warned: DirtyUniforms,
}

impl<G: GlBackend> RenderEngine<G> {
    pub fn new(gl: G, config: VisualizerConfig) -> Result<Self, VisualizerError> {
        let composer =
            ShaderComposer::with_builtins(&config.default_geometry, &config.default_projection)
                .map_err(|e| VisualizerError::InitializationFailure(e.to_string()))?;
        Ok(Self::with_composer(gl, composer, config))
    }

    pub fn with_composer(gl: G, composer: ShaderComposer<G>, config: VisualizerConfig) -> Self {
        let state = VisualState::new(&config);
        Self {
            gl,
            composer,
            config,
            state,
            quad: None,
            running: false,
            started_at: Instant::now(),
            on_error: None,
            error_reported: false,
            context_lost: false,
            disposed: false,
            unresolved_warned: DirtyUniforms::default(),
        }
    }

    pub fn set_error_callback(&mut self, callback: impl FnMut(&VisualizerError) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    pub fn state(&self) -> &VisualState {
        &self.state
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    pub fn composer(&self) -> &ShaderComposer<G> {
        &self.composer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn update_parameters(&mut self, update: &VisualUpdate) {
        if self.disposed {
            return;
        }
        self.state.apply(update);
    }

    /// Begin (or resume) rendering. The first frame afterwards uploads every uniform.
    pub fn start(&mut self) -> bool {
        if self.disposed || self.context_lost {
            log::warn!("[render] start ignored: engine disposed or context lost");
            return false;
        }
        if self.quad.is_none() {
            match self
                .gl
                .create_vertex_buffer(bytemuck::cast_slice(&QUAD_VERTICES[..]))
            {
                Some(buffer) => self.quad = Some(buffer),
                None => {
                    self.report_error(VisualizerError::InitializationFailure(
                        "could not allocate quad buffer".to_string(),
                    ));
                    return false;
                }
            }
        }
        if self.composer.program(&self.config.program_name).is_none() {
            self.state.needs_rebuild = true;
        }
        self.state.dirty.mark_all();
        self.started_at = Instant::now();
        self.state.time = 0.0;
        self.error_reported = false;
        self.running = true;
        log::info!("[render] started");
        true
    }

    /// Stop scheduling frames. Safe to call from an error path mid-frame.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("[render] stopped");
        }
        self.running = false;
    }

    /// Note an externally observed context loss (e.g. a `webglcontextlost` event).
    pub fn notify_context_lost(&mut self) {
        if self.context_lost {
            return;
        }
        self.context_lost = true;
        self.running = false;
        log::error!("[render] graphics context lost");
        self.emit_error(&VisualizerError::ContextLoss);
    }

    pub fn render_frame(&mut self) -> FrameStatus {
        self.render_frame_at(Instant::now())
    }

    pub fn render_frame_at(&mut self, now: Instant) -> FrameStatus {
        if !self.running {
            return FrameStatus::Stopped;
        }
        if self.context_lost || self.gl.is_context_lost() {
            self.notify_context_lost();
            return FrameStatus::Halted;
        }

        if now > self.started_at {
            self.state.time = now.duration_since(self.started_at).as_secs_f32();
        }
        self.state.dirty.mark(UniformId::Time);
        self.sync_canvas_size();

        if self.state.needs_rebuild {
            if let Err(e) = self.rebuild() {
                self.halt(VisualizerError::CompileLinkFailure(e));
                return FrameStatus::Halted;
            }
        }
        if !self
            .composer
            .use_program(&mut self.gl, &self.config.program_name)
        {
            self.state.needs_rebuild = true;
            return FrameStatus::Stopped;
        }

        self.upload_uniforms();

        let (w, h) = self.gl.drawing_buffer_size();
        self.gl.viewport(w, h);
        self.gl.clear(self.config.clear_color);
        let attribute = self
            .composer
            .attribute_location(&mut self.gl, POSITION_ATTRIBUTE);
        if let (Some(buffer), Some(attribute)) = (&self.quad, attribute) {
            self.gl.bind_vertex_buffer(buffer, attribute, 2);
            self.gl.draw_quad();
        }
        FrameStatus::Drawn
    }

    fn sync_canvas_size(&mut self) {
        let (dw, dh) = self.gl.display_size();
        if dw > 0 && dh > 0 && self.gl.drawing_buffer_size() != (dw, dh) {
            self.gl.resize_drawing_buffer(dw, dh);
        }
        let (w, h) = self.gl.drawing_buffer_size();
        let resolution = [w as f32, h as f32];
        if self.state.resolution != resolution {
            log::debug!("[render] resolution {}x{}", w, h);
            self.state.resolution = resolution;
            self.state.dirty.mark(UniformId::Resolution);
        }
    }

    fn rebuild(&mut self) -> Result<(), ShaderError> {
        let program = self.config.program_name.clone();
        match self.config.lattice_source {
            LatticeSource::InlineTemplate => {
                self.composer
                    .compose(&mut self.gl, &program, &self.state.projection)?
            }
            LatticeSource::GeometryStrategy => self.composer.compose_with_geometry(
                &mut self.gl,
                &program,
                &self.state.geometry,
                &self.state.projection,
            )?,
        }
        self.state.needs_rebuild = false;
        self.state.dirty.mark_all();
        self.unresolved_warned.clear_all();
        self.composer.use_program(&mut self.gl, &program);
        Ok(())
    }

    fn upload_uniforms(&mut self) {
        let pending = self.state.dirty;
        for id in pending.iter() {
            match self.composer.uniform_location(&mut self.gl, id.name()) {
                Some(location) => {
                    self.gl
                        .set_uniform(&location, self.state.uniform_value(id));
                    self.state.dirty.clear(id);
                }
                None => {
                    // Left dirty; retried every frame until a rebuild resolves it.
                    if !self.unresolved_warned.contains(id) {
                        log::warn!("[render] uniform '{}' has no location", id.name());
                        self.unresolved_warned.mark(id);
                    }
                }
            }
        }
    }

    fn halt(&mut self, error: VisualizerError) {
        self.stop();
        self.report_error(error);
    }

    fn report_error(&mut self, error: VisualizerError) {
        if self.error_reported {
            return;
        }
        self.error_reported = true;
        log::error!("[render] {}", error);
        self.emit_error(&error);
    }

    fn emit_error(&mut self, error: &VisualizerError) {
        if let Some(cb) = self.on_error.as_mut() {
            cb(error);
        }
    }

    /// Stop, then release the quad and every compiled program. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop();
        let live = !self.context_lost && !self.gl.is_context_lost();
        if let Some(buffer) = self.quad.take() {
            if live {
                self.gl.delete_buffer(&buffer);
            }
        }
        if live {
            self.composer.dispose(&mut self.gl);
        } else {
            self.composer.abandon();
        }
        self.disposed = true;
        log::info!("[render] disposed");
    }
}
