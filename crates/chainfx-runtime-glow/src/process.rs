use crate::mesh::Mesh;

/// Mutable render state threaded through every stage of one `ImageChain` execution.
///
/// Stages read `src_texture` and write `dst_texture`; a stage that writes swaps the two before
/// returning so the next stage reads its result. `width`/`height` are the current image size
/// and may be rewritten by resizing stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessData {
    pub src_texture: glow::NativeTexture,
    pub dst_texture: glow::NativeTexture,
    pub framebuffer: glow::NativeFramebuffer,
    pub width: i32,
    pub height: i32,
}

impl ProcessData {
    pub fn has_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn swap(&mut self) {
        core::mem::swap(&mut self.src_texture, &mut self.dst_texture);
    }
}

/// GPU handles every filter may use during a render. The GL context must be current.
#[derive(Clone, Copy)]
pub struct RenderCtx<'a> {
    pub gl: &'a glow::Context,
    pub mesh: &'a Mesh,
}

impl std::fmt::Debug for RenderCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `glow::Context` holds a function table; print the mesh only.
        f.debug_struct("RenderCtx")
            .field("gl", &"<glow context>")
            .field("mesh", self.mesh)
            .finish()
    }
}
