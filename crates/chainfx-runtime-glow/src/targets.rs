use glow::HasContext;

use crate::process::ProcessData;
use crate::EngineError;

/// Colour a destination is cleared to before each pass. Anything left magenta in a result
/// was never written by a shader.
pub const SENTINEL_CLEAR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// The two ping-pong textures and the single framebuffer shared by a whole chain.
#[derive(Debug)]
pub struct ChainTargets {
    pub framebuffer: glow::NativeFramebuffer,
    pub textures: [glow::NativeTexture; 2],
}

unsafe fn create_chain_texture(gl: &glow::Context) -> Result<glow::NativeTexture, EngineError> {
    let tex = gl
        .create_texture()
        .map_err(|e| EngineError::GlCreate(format!("create_texture failed: {e:?}")))?;
    gl.bind_texture(glow::TEXTURE_2D, Some(tex));
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    gl.bind_texture(glow::TEXTURE_2D, None);
    Ok(tex)
}

impl ChainTargets {
    /// Texture storage is allocated per pass (sizes change along the chain), so only names
    /// are created here.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let framebuffer = gl
            .create_framebuffer()
            .map_err(|e| EngineError::GlCreate(format!("create_framebuffer failed: {e:?}")))?;
        let a = match create_chain_texture(gl) {
            Ok(t) => t,
            Err(e) => {
                gl.delete_framebuffer(framebuffer);
                return Err(e);
            }
        };
        let b = match create_chain_texture(gl) {
            Ok(t) => t,
            Err(e) => {
                gl.delete_texture(a);
                gl.delete_framebuffer(framebuffer);
                return Err(e);
            }
        };
        Ok(Self {
            framebuffer,
            textures: [a, b],
        })
    }

    /// Fresh per-render context: `src` is texture 0, `dst` texture 1, no size yet.
    pub fn process_data(&self) -> ProcessData {
        ProcessData {
            src_texture: self.textures[0],
            dst_texture: self.textures[1],
            framebuffer: self.framebuffer,
            width: 0,
            height: 0,
        }
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_framebuffer(self.framebuffer);
        for t in self.textures {
            gl.delete_texture(t);
        }
    }
}

/// Size `data.dst_texture` to the current dimensions, attach it to the shared framebuffer,
/// set the viewport and clear. The framebuffer stays bound for the draw that follows.
pub unsafe fn prepare_destination(
    gl: &glow::Context,
    data: &ProcessData,
) -> Result<(), EngineError> {
    gl.bind_texture(glow::TEXTURE_2D, Some(data.dst_texture));
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA8 as i32,
        data.width,
        data.height,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        None,
    );
    gl.bind_texture(glow::TEXTURE_2D, None);

    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(data.framebuffer));
    gl.framebuffer_texture_2d(
        glow::FRAMEBUFFER,
        glow::COLOR_ATTACHMENT0,
        glow::TEXTURE_2D,
        Some(data.dst_texture),
        0,
    );
    let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
    if status != glow::FRAMEBUFFER_COMPLETE {
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        return Err(EngineError::GlCreate(format!(
            "framebuffer incomplete: 0x{status:x}"
        )));
    }

    gl.viewport(0, 0, data.width, data.height);
    gl.disable(glow::DEPTH_TEST);
    let [r, g, b, a] = SENTINEL_CLEAR;
    gl.clear_color(r, g, b, a);
    gl.clear(glow::COLOR_BUFFER_BIT);
    Ok(())
}

/// Upload tightly packed RGBA8 rows into `tex` and build its mip chain.
pub unsafe fn upload_rgba(
    gl: &glow::Context,
    tex: glow::NativeTexture,
    width: i32,
    height: i32,
    bytes: &[u8],
) {
    gl.bind_texture(glow::TEXTURE_2D, Some(tex));
    gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA8 as i32,
        width,
        height,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        Some(bytes),
    );
    gl.generate_mipmap(glow::TEXTURE_2D);
    gl.bind_texture(glow::TEXTURE_2D, None);
}

/// Read the colour attachment of `framebuffer` into a new `width * height * 4` buffer.
pub unsafe fn read_rgba(
    gl: &glow::Context,
    framebuffer: glow::NativeFramebuffer,
    width: i32,
    height: i32,
) -> Vec<u8> {
    let mut buf = vec![0u8; width.max(0) as usize * height.max(0) as usize * 4];
    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
    gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
    gl.read_pixels(
        0,
        0,
        width,
        height,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        glow::PixelPackData::Slice(&mut buf[..]),
    );
    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    buf
}
