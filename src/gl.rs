use hypercube_core::gl::{GlBackend, ShaderStage, UniformValue};
use wasm_bindgen::JsCast;
use web_sys as web;
use web_sys::WebGl2RenderingContext as Gl;

use crate::dom;

/// WebGL2 rendering for the core engine.
pub struct WebGlBackend {
    gl: Gl,
    canvas: web::HtmlCanvasElement,
}

impl WebGlBackend {
    pub fn new(canvas: &web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| anyhow::anyhow!("webgl2 context error: {:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("webgl2 is not available"))?
            .dyn_into::<Gl>()
            .map_err(|e| anyhow::anyhow!("unexpected context type: {:?}", e))?;
        Ok(Self {
            gl,
            canvas: canvas.clone(),
        })
    }
}

impl GlBackend for WebGlBackend {
    type Shader = web::WebGlShader;
    type Program = web::WebGlProgram;
    type UniformLocation = web::WebGlUniformLocation;
    type Buffer = web::WebGlBuffer;

    fn is_context_lost(&self) -> bool {
        self.gl.is_context_lost()
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String> {
        let kind = match stage {
            ShaderStage::Vertex => Gl::VERTEX_SHADER,
            ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or_else(|| format!("could not create {} shader object", stage))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);
        let ok = self
            .gl
            .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if ok {
            return Ok(shader);
        }
        let log = self
            .gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown compile error".to_string());
        self.gl.delete_shader(Some(&shader));
        Err(log)
    }

    fn delete_shader(&mut self, shader: &Self::Shader) {
        self.gl.delete_shader(Some(shader));
    }

    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, String> {
        let program = self
            .gl
            .create_program()
            .ok_or_else(|| "could not create program object".to_string())?;
        self.gl.attach_shader(&program, vertex);
        self.gl.attach_shader(&program, fragment);
        self.gl.link_program(&program);
        let ok = self
            .gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if ok {
            return Ok(program);
        }
        let log = self
            .gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown link error".to_string());
        self.gl.delete_program(Some(&program));
        Err(log)
    }

    fn delete_program(&mut self, program: &Self::Program) {
        self.gl.delete_program(Some(program));
    }

    fn use_program(&mut self, program: &Self::Program) {
        self.gl.use_program(Some(program));
    }

    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn attribute_location(&mut self, program: &Self::Program, name: &str) -> Option<u32> {
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn set_uniform(&mut self, location: &Self::UniformLocation, value: UniformValue) {
        let loc = Some(location);
        match value {
            UniformValue::Float(v) => self.gl.uniform1f(loc, v),
            UniformValue::Vec2([x, y]) => self.gl.uniform2f(loc, x, y),
            UniformValue::Vec3([x, y, z]) => self.gl.uniform3f(loc, x, y, z),
            UniformValue::Int(v) => self.gl.uniform1i(loc, v),
        }
    }

    fn create_vertex_buffer(&mut self, bytes: &[u8]) -> Option<Self::Buffer> {
        let buffer = self.gl.create_buffer()?;
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        self.gl
            .buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytes, Gl::STATIC_DRAW);
        Some(buffer)
    }

    fn bind_vertex_buffer(&mut self, buffer: &Self::Buffer, attribute: u32, components: i32) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl.enable_vertex_attrib_array(attribute);
        self.gl
            .vertex_attrib_pointer_with_i32(attribute, components, Gl::FLOAT, false, 0, 0);
    }

    fn delete_buffer(&mut self, buffer: &Self::Buffer) {
        self.gl.delete_buffer(Some(buffer));
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn display_size(&self) -> (u32, u32) {
        dom::display_size(&self.canvas)
    }

    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT);
    }

    fn draw_quad(&mut self) {
        self.gl.draw_arrays(Gl::TRIANGLE_STRIP, 0, 4);
    }
}
