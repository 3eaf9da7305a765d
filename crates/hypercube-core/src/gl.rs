use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Int(i32),
}

/// The WebGL2 calls the visualizer needs, with handles as associated types.
pub trait GlBackend {
    type Shader;
    type Program;
    type UniformLocation: Clone;
    type Buffer;

    fn is_context_lost(&self) -> bool;

    /// Compile a shader object; `Err` carries the driver's info log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;
    fn delete_shader(&mut self, shader: &Self::Shader);
    /// Link a program from compiled stages; `Err` carries the link info log.
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, String>;
    fn delete_program(&mut self, program: &Self::Program);
    fn use_program(&mut self, program: &Self::Program);

    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn attribute_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;
    fn set_uniform(&mut self, location: &Self::UniformLocation, value: UniformValue);

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Option<Self::Buffer>;
    fn bind_vertex_buffer(&mut self, buffer: &Self::Buffer, attribute: u32, components: i32);
    fn delete_buffer(&mut self, buffer: &Self::Buffer);

    /// Size of the drawing buffer in device pixels.
    fn drawing_buffer_size(&self) -> (u32, u32);
    /// Size the canvas is displayed at, in device pixels.
    fn display_size(&self) -> (u32, u32);
    fn resize_drawing_buffer(&mut self, width: u32, height: u32);

    fn viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: [f32; 4]);
    /// Draw the currently bound quad as a 4-vertex triangle strip.
    fn draw_quad(&mut self);
}
