use std::any::Any;

use chainfx_core::ParamValue;
use chainfx_graph::{FilterKind, FilterType, MAX_INPUTS, MAX_OUTPUTS};
use glow::HasContext;

use crate::process::{ProcessData, RenderCtx};
use crate::program::Program;
use crate::shaders;
use crate::targets::prepare_destination;
use crate::EngineError;

/// A node of an image chain.
///
/// Links between nodes are held by the chain (`chainfx_graph::Graph`); a filter only knows how
/// to configure itself and how to process the current `ProcessData`.
pub trait Filter: std::fmt::Debug + Any {
    fn filter_type(&self) -> FilterType;

    fn kind(&self) -> FilterKind {
        self.filter_type().kind()
    }

    fn max_input_number(&self) -> u32 {
        MAX_INPUTS
    }

    fn max_output_number(&self) -> u32 {
        MAX_OUTPUTS
    }

    /// Apply one named parameter. Keys a filter does not understand are rejected with
    /// `EngineError::UnknownParam`.
    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError>;

    /// The filter's actual work. Only called through `process`.
    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError>;

    /// Entry point used by the chain. Returns `Ok(false)` without touching the GPU when there
    /// is nothing to process (no slots, or an empty image).
    unsafe fn process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<bool, EngineError> {
        if self.max_input_number() == 0 || self.max_output_number() == 0 || !data.has_size() {
            return Ok(false);
        }
        self.do_process(ctx, data)?;
        Ok(true)
    }

    /// Release GL objects owned by this filter.
    unsafe fn destroy(&mut self, _gl: &glow::Context) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The shader half of an effect filter: one program, one draw over the shared mesh.
///
/// The program is built the first time the pass runs (the context is only guaranteed to be
/// current from then on). A failed build is logged once and the pass stays unusable.
#[derive(Debug)]
pub struct AlgoPass {
    label: &'static str,
    frag_src: &'static str,
    program: Program,
    build_attempted: bool,
}

impl AlgoPass {
    pub fn new(label: &'static str, frag_src: &'static str) -> Self {
        Self {
            label,
            frag_src,
            program: Program::new(),
            build_attempted: false,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub unsafe fn ensure_program(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        if !self.build_attempted {
            self.build_attempted = true;
            if let Err(e) = self.program.compile(gl, shaders::VERTEX, self.frag_src) {
                tracing::error!(filter = self.label, error = %e, "pass disabled");
            }
        }
        if self.program.is_linked() {
            Ok(())
        } else {
            Err(EngineError::ProgramUnavailable(self.label))
        }
    }

    /// Prepare → load params → draw → unbind, then swap `src`/`dst`.
    ///
    /// `load_params` runs with the program bound and receives it for uniform uploads.
    pub unsafe fn run<F>(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
        load_params: F,
    ) -> Result<(), EngineError>
    where
        F: FnOnce(&glow::Context, &Program),
    {
        self.ensure_program(ctx.gl)?;
        let gl = ctx.gl;

        prepare_destination(gl, data)?;

        gl.use_program(self.program.id());
        load_params(gl, &self.program);

        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_2D, Some(data.src_texture));
        self.program.set_sampler(gl, "u_texture", 0);
        ctx.mesh.draw(gl);

        gl.bind_texture(glow::TEXTURE_2D, None);
        gl.use_program(None);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);

        data.swap();
        Ok(())
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.program.delete(gl);
        self.build_attempted = false;
    }
}

/// Reads a finite scalar parameter.
pub(crate) fn expect_number(
    filter: &'static str,
    key: &str,
    value: &ParamValue,
) -> Result<f32, EngineError> {
    match value.as_f32() {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(EngineError::InvalidParam {
            filter,
            key: key.to_string(),
            msg: format!("{v} is not finite"),
        }),
        None => Err(EngineError::InvalidParam {
            filter,
            key: key.to_string(),
            msg: format!("expected a number, got {}", value.type_name()),
        }),
    }
}

pub(crate) fn expect_text<'v>(
    filter: &'static str,
    key: &str,
    value: &'v ParamValue,
) -> Result<&'v str, EngineError> {
    value.as_str().ok_or_else(|| EngineError::InvalidParam {
        filter,
        key: key.to_string(),
        msg: format!("expected a string, got {}", value.type_name()),
    })
}

pub(crate) fn unknown_param(filter: &'static str, key: &str) -> EngineError {
    EngineError::UnknownParam {
        filter,
        key: key.to_string(),
    }
}

/// Implements the `Any` accessors for a concrete filter.
macro_rules! impl_as_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
pub(crate) use impl_as_any;
