use glow::HasContext;

use crate::EngineError;

/// Clip-space corners, counter-clockwise from bottom-left.
const POSITIONS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0];

/// Texture coordinates; v = 0 is the first uploaded row.
const TEXCOORDS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_TEXCOORD: u32 = 1;

/// Full-screen quad shared by every shader pass of a chain.
#[derive(Debug)]
pub struct Mesh {
    vao: glow::NativeVertexArray,
    position_vbo: glow::NativeBuffer,
    texcoord_vbo: glow::NativeBuffer,
    ibo: glow::NativeBuffer,
    deleted: bool,
}

impl Mesh {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let vao = gl
            .create_vertex_array()
            .map_err(|e| EngineError::GlCreate(format!("create_vertex_array: {e}")))?;
        let position_vbo = gl
            .create_buffer()
            .map_err(|e| EngineError::GlCreate(format!("create_buffer(position): {e}")))?;
        let texcoord_vbo = gl
            .create_buffer()
            .map_err(|e| EngineError::GlCreate(format!("create_buffer(texcoord): {e}")))?;
        let ibo = gl
            .create_buffer()
            .map_err(|e| EngineError::GlCreate(format!("create_buffer(index): {e}")))?;

        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(position_vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&POSITIONS),
            glow::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(ATTRIB_POSITION);
        gl.vertex_attrib_pointer_f32(ATTRIB_POSITION, 2, glow::FLOAT, false, 2 * 4, 0);

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(texcoord_vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&TEXCOORDS),
            glow::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(ATTRIB_TEXCOORD);
        gl.vertex_attrib_pointer_f32(ATTRIB_TEXCOORD, 2, glow::FLOAT, false, 2 * 4, 0);

        // The element binding is VAO state, so it stays bound while the VAO is.
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&INDICES),
            glow::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

        Ok(Self {
            vao,
            position_vbo,
            texcoord_vbo,
            ibo,
            deleted: false,
        })
    }

    /// One indexed draw over the two triangles. The caller binds program and textures.
    pub unsafe fn draw(&self, gl: &glow::Context) {
        if self.deleted {
            tracing::warn!("Mesh::draw called after delete");
            return;
        }
        gl.bind_vertex_array(Some(self.vao));
        gl.draw_elements(glow::TRIANGLES, INDICES.len() as i32, glow::UNSIGNED_SHORT, 0);
        gl.bind_vertex_array(None);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Release the GL objects. Safe to call more than once.
    pub unsafe fn delete(&mut self, gl: &glow::Context) {
        if self.deleted {
            return;
        }
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.position_vbo);
        gl.delete_buffer(self.texcoord_vbo);
        gl.delete_buffer(self.ibo);
        self.deleted = true;
    }
}
