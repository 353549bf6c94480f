use chainfx_core::ParamValue;
use chainfx_graph::FilterType;

use crate::filter::{expect_number, impl_as_any, unknown_param, AlgoPass, Filter};
use crate::process::{ProcessData, RenderCtx};
use crate::shaders;
use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub scale: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Resamples the image. Downstream stages see the new `width`/`height`.
#[derive(Debug)]
pub struct ScaleFilter {
    params: ScaleParams,
    /// Exact output size; overrides `scale` when set.
    target_size: Option<(i32, i32)>,
    pass: AlgoPass,
}

impl Default for ScaleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleFilter {
    pub fn new() -> Self {
        Self {
            params: ScaleParams::default(),
            target_size: None,
            pass: AlgoPass::new("Scale", shaders::PASSTHROUGH_FRAG),
        }
    }

    pub fn with_scale(scale: f32) -> Self {
        let mut f = Self::new();
        f.params.scale = scale;
        f
    }

    pub fn params(&self) -> ScaleParams {
        self.params
    }

    pub(crate) fn set_target_size(&mut self, size: Option<(i32, i32)>) {
        self.target_size = size;
    }

    /// Output size for an input of `w` x `h`. Never below 1x1.
    pub fn output_size(&self, w: i32, h: i32) -> (i32, i32) {
        if let Some(size) = self.target_size {
            return size;
        }
        let s = self.params.scale;
        let sw = ((w as f32) * s).round() as i32;
        let sh = ((h as f32) * s).round() as i32;
        (sw.max(1), sh.max(1))
    }
}

impl Filter for ScaleFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Scale
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "scale" => {
                let s = expect_number("Scale", key, value)?;
                if s <= 0.0 {
                    return Err(EngineError::InvalidParam {
                        filter: "Scale",
                        key: key.to_string(),
                        msg: format!("{s} must be positive"),
                    });
                }
                self.params.scale = s;
                Ok(())
            }
            _ => Err(unknown_param("Scale", key)),
        }
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let (w, h) = self.output_size(data.width, data.height);
        tracing::trace!(from_w = data.width, from_h = data.height, w, h, "scale");
        data.width = w;
        data.height = h;
        // The destination is allocated at the new size; linear sampling does the resampling.
        self.pass.run(ctx, data, |_, _| {})
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.pass.destroy(gl);
    }

    impl_as_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_size_rounds_and_never_collapses() {
        let f = ScaleFilter::with_scale(0.25);
        assert_eq!(f.output_size(512, 512), (128, 128));
        assert_eq!(f.output_size(2, 3), (1, 1));

        let up = ScaleFilter::with_scale(4.0);
        assert_eq!(up.output_size(128, 100), (512, 400));
    }

    #[test]
    fn target_size_wins_over_factor() {
        let mut f = ScaleFilter::with_scale(4.0);
        f.set_target_size(Some((513, 257)));
        assert_eq!(f.output_size(128, 64), (513, 257));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let mut f = ScaleFilter::new();
        assert!(f.set_value("scale", &ParamValue::Number(0.0)).is_err());
        assert!(f.set_value("scale", &ParamValue::Number(-2.0)).is_err());
        f.set_value("scale", &ParamValue::Number(0.5)).unwrap();
        assert_eq!(f.params().scale, 0.5);
    }
}
