//! Separable blur: one-dimensional passes and the composite Gaussian.

use chainfx_core::ParamValue;
use chainfx_graph::FilterType;

use crate::filter::{impl_as_any, unknown_param, AlgoPass, Filter};
use crate::filters::scale::ScaleFilter;
use crate::process::{ProcessData, RenderCtx};
use crate::shaders;
use crate::EngineError;

pub const BLUR_TAPS: usize = 3;

/// Taps for one direction. `weight[0]` is the centre sample; taps 1 and 2 are applied on
/// both sides at `±offset[i]` texels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    pub weight: [f32; BLUR_TAPS],
    pub offset: [f32; BLUR_TAPS],
}

impl Default for BlurParams {
    /// 9-tap binomial kernel folded into 5 bilinear fetches.
    fn default() -> Self {
        Self {
            weight: [0.227_027_03, 0.316_216_22, 0.070_270_27],
            offset: [0.0, 1.384_615_4, 3.230_769_2],
        }
    }
}

impl BlurParams {
    fn set(&mut self, filter: &'static str, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        let slot = match key {
            "weight" => &mut self.weight,
            "offset" => &mut self.offset,
            _ => return Err(unknown_param(filter, key)),
        };
        let taps = value.as_array().ok_or_else(|| EngineError::InvalidParam {
            filter,
            key: key.to_string(),
            msg: format!("expected an array, got {}", value.type_name()),
        })?;
        if taps.len() != BLUR_TAPS {
            return Err(EngineError::InvalidParam {
                filter,
                key: key.to_string(),
                msg: format!("expected {BLUR_TAPS} values, got {}", taps.len()),
            });
        }
        if taps.iter().any(|t| !t.is_finite()) {
            return Err(EngineError::InvalidParam {
                filter,
                key: key.to_string(),
                msg: "values must be finite".into(),
            });
        }
        slot.copy_from_slice(taps);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    Horizontal,
    Vertical,
}

/// A single-direction blur pass (`HorizontalBlur` / `VerticalBlur`).
#[derive(Debug)]
pub struct BlurFilter {
    axis: BlurAxis,
    params: BlurParams,
    pass: AlgoPass,
}

impl BlurFilter {
    pub fn new(axis: BlurAxis) -> Self {
        let label = match axis {
            BlurAxis::Horizontal => "HorizontalBlur",
            BlurAxis::Vertical => "VerticalBlur",
        };
        Self {
            axis,
            params: BlurParams::default(),
            pass: AlgoPass::new(label, shaders::BLUR_FRAG),
        }
    }

    pub fn horizontal() -> Self {
        Self::new(BlurAxis::Horizontal)
    }

    pub fn vertical() -> Self {
        Self::new(BlurAxis::Vertical)
    }

    pub fn axis(&self) -> BlurAxis {
        self.axis
    }

    pub fn params(&self) -> BlurParams {
        self.params
    }

    /// One texel along the blur axis, in texture coordinates.
    pub fn step(&self, width: i32, height: i32) -> (f32, f32) {
        match self.axis {
            BlurAxis::Horizontal => (1.0 / width.max(1) as f32, 0.0),
            BlurAxis::Vertical => (0.0, 1.0 / height.max(1) as f32),
        }
    }
}

impl Filter for BlurFilter {
    fn filter_type(&self) -> FilterType {
        match self.axis {
            BlurAxis::Horizontal => FilterType::HorizontalBlur,
            BlurAxis::Vertical => FilterType::VerticalBlur,
        }
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        let name = self.filter_type().name();
        self.params.set(name, key, value)
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let p = self.params;
        let (sx, sy) = self.step(data.width, data.height);
        self.pass.run(ctx, data, |gl, prog| {
            prog.set_vec2(gl, "u_step", sx, sy);
            prog.set_f32_array(gl, "u_weight", &p.weight);
            prog.set_f32_array(gl, "u_offset", &p.offset);
        })
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.pass.destroy(gl);
    }

    impl_as_any!();
}

pub const GAUSSIAN_DOWNSCALE: f32 = 0.25;

/// Scale down → horizontal → vertical → scale up, as one opaque node.
///
/// The final scale restores the exact input size, so sizes that are not multiples of 4 survive
/// the round trip.
#[derive(Debug)]
pub struct GaussianBlurFilter {
    down: ScaleFilter,
    horizontal: BlurFilter,
    vertical: BlurFilter,
    up: ScaleFilter,
}

impl Default for GaussianBlurFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianBlurFilter {
    pub fn new() -> Self {
        Self {
            down: ScaleFilter::with_scale(GAUSSIAN_DOWNSCALE),
            horizontal: BlurFilter::horizontal(),
            vertical: BlurFilter::vertical(),
            up: ScaleFilter::new(),
        }
    }

    pub fn horizontal(&self) -> &BlurFilter {
        &self.horizontal
    }

    pub fn vertical(&self) -> &BlurFilter {
        &self.vertical
    }

    /// Sizes after each internal stage for a `w` x `h` input. Points the last stage back at
    /// the input size.
    pub(crate) fn plan_stages(&mut self, w: i32, h: i32) -> [(i32, i32); 4] {
        self.up.set_target_size(Some((w, h)));
        let down = self.down.output_size(w, h);
        [down, down, down, self.up.output_size(down.0, down.1)]
    }
}

impl Filter for GaussianBlurFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::GaussianBlur
    }

    /// `weight` / `offset` configure both directions.
    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "weight" | "offset" => {
                // Validate once so a bad value leaves both children untouched.
                let mut probe = self.horizontal.params;
                probe.set("GaussianBlur", key, value)?;
                self.horizontal.params = probe;
                self.vertical.params = probe;
                Ok(())
            }
            _ => Err(unknown_param("GaussianBlur", key)),
        }
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let sizes = self.plan_stages(data.width, data.height);
        tracing::trace!(?sizes, "GaussianBlur stages");

        let stages: [&mut dyn Filter; 4] = [
            &mut self.down,
            &mut self.horizontal,
            &mut self.vertical,
            &mut self.up,
        ];
        for stage in stages {
            if !stage.process(ctx, data)? {
                return Err(EngineError::other(format!(
                    "GaussianBlur: {} stage had an empty image",
                    stage.filter_type()
                )));
            }
        }
        Ok(())
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.down.destroy(gl);
        self.horizontal.destroy(gl);
        self.vertical.destroy(gl);
        self.up.destroy(gl);
    }

    impl_as_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kernel_is_normalised() {
        let p = BlurParams::default();
        let total = p.weight[0] + 2.0 * (p.weight[1] + p.weight[2]);
        assert!((total - 1.0).abs() < 1e-4, "weights sum to {total}");
    }

    #[test]
    fn blur_arrays_must_have_three_taps() {
        let mut f = BlurFilter::horizontal();
        let err = f
            .set_value("weight", &ParamValue::Array(vec![0.5, 0.25]))
            .expect_err("two taps");
        assert!(matches!(err, EngineError::InvalidParam { .. }));

        f.set_value("offset", &ParamValue::Array(vec![0.0, 1.0, 2.0]))
            .unwrap();
        assert_eq!(f.params().offset, [0.0, 1.0, 2.0]);
        assert_eq!(f.filter_type(), FilterType::HorizontalBlur);
    }

    #[test]
    fn step_follows_the_axis() {
        assert_eq!(BlurFilter::horizontal().step(200, 100), (0.005, 0.0));
        assert_eq!(BlurFilter::vertical().step(200, 100), (0.0, 0.01));
    }

    #[test]
    fn gaussian_forwards_taps_to_both_directions() {
        let mut g = GaussianBlurFilter::new();
        g.set_value("weight", &ParamValue::Array(vec![0.4, 0.2, 0.1]))
            .unwrap();
        assert_eq!(g.horizontal().params().weight, [0.4, 0.2, 0.1]);
        assert_eq!(g.vertical().params().weight, [0.4, 0.2, 0.1]);

        assert!(g.set_value("weight", &ParamValue::Number(1.0)).is_err());
        assert_eq!(g.vertical().params().weight, [0.4, 0.2, 0.1]);
        assert!(g.set_value("radius", &ParamValue::Number(3.0)).is_err());
    }

    #[test]
    fn gaussian_returns_to_the_input_size() {
        let mut g = GaussianBlurFilter::new();
        assert_eq!(g.plan_stages(512, 512), [(128, 128), (128, 128), (128, 128), (512, 512)]);

        // 201 / 4 rounds to 50; a plain x4 would give 200.
        let sizes = g.plan_stages(201, 119);
        assert_eq!(sizes[0], (50, 30));
        assert_eq!(sizes[3], (201, 119));

        // Re-planning follows the new input, not the previous one.
        assert_eq!(g.plan_stages(3, 3)[3], (3, 3));
    }
}
