use glow::HasContext;

use crate::EngineError;

/// Compile and link a vertex + fragment pair. Shader objects are always released; the program
/// is released too when linking fails.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, EngineError> {
    let vs = gl
        .create_shader(glow::VERTEX_SHADER)
        .map_err(|e| EngineError::GlCreate(format!("create_shader(VS) failed: {e:?}")))?;
    gl.shader_source(vs, vert_src);
    gl.compile_shader(vs);
    if !gl.get_shader_compile_status(vs) {
        let log = gl.get_shader_info_log(vs);
        gl.delete_shader(vs);
        return Err(EngineError::VertexCompile(log));
    }

    let fs = match gl.create_shader(glow::FRAGMENT_SHADER) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(EngineError::GlCreate(format!(
                "create_shader(FS) failed: {e:?}"
            )));
        }
    };
    gl.shader_source(fs, frag_src);
    gl.compile_shader(fs);
    if !gl.get_shader_compile_status(fs) {
        let log = gl.get_shader_info_log(fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        return Err(EngineError::FragmentCompile(log));
    }

    let program = match gl.create_program() {
        Ok(p) => p,
        Err(e) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(EngineError::GlCreate(format!("create_program failed: {e:?}")));
        }
    };
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(EngineError::Link(log));
    }

    Ok(program)
}

/// A linked GPU program owned by one filter instance.
///
/// `compile` may be called again; the previous program is released first, so recompiling never
/// leaks GL objects. Driver diagnostics from the last attempt are kept in `log`.
#[derive(Debug, Default)]
pub struct Program {
    id: Option<glow::NativeProgram>,
    log: String,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub unsafe fn compile(
        &mut self,
        gl: &glow::Context,
        vert_src: &str,
        frag_src: &str,
    ) -> Result<(), EngineError> {
        self.delete(gl);
        self.log.clear();

        match compile_program(gl, vert_src, frag_src) {
            Ok(p) => {
                self.id = Some(p);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "shader program failed to build");
                self.log = e.to_string();
                Err(e)
            }
        }
    }

    pub fn id(&self) -> Option<glow::NativeProgram> {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.id.is_some()
    }

    /// Diagnostics from the last `compile`; empty on success.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub unsafe fn uniform_location(
        &self,
        gl: &glow::Context,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        self.id.and_then(|p| gl.get_uniform_location(p, name))
    }

    pub unsafe fn set_f32(&self, gl: &glow::Context, name: &str, v: f32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_1_f32(Some(&loc), v);
        }
    }

    pub unsafe fn set_vec2(&self, gl: &glow::Context, name: &str, x: f32, y: f32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_2_f32(Some(&loc), x, y);
        }
    }

    pub unsafe fn set_f32_array(&self, gl: &glow::Context, name: &str, v: &[f32]) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_1_f32_slice(Some(&loc), v);
        }
    }

    pub unsafe fn set_sampler(&self, gl: &glow::Context, name: &str, unit: i32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_1_i32(Some(&loc), unit);
        }
    }

    pub unsafe fn delete(&mut self, gl: &glow::Context) {
        if let Some(p) = self.id.take() {
            gl.delete_program(p);
        }
    }
}
