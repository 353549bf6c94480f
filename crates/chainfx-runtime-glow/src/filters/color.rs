//! Per-pixel colour adjustments: contrast, saturation, brightness.

use chainfx_core::ParamValue;
use chainfx_graph::FilterType;

use crate::filter::{expect_number, impl_as_any, unknown_param, AlgoPass, Filter};
use crate::process::{ProcessData, RenderCtx};
use crate::shaders;
use crate::EngineError;

/// Contrast around mid-grey. Nominal range 0.0 (flat grey) to 4.0; 1.0 is identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastParams {
    pub contrast: f32,
}

impl Default for ContrastParams {
    fn default() -> Self {
        Self { contrast: 1.0 }
    }
}

#[derive(Debug)]
pub struct ContrastFilter {
    params: ContrastParams,
    pass: AlgoPass,
}

impl Default for ContrastFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContrastFilter {
    pub fn new() -> Self {
        Self {
            params: ContrastParams::default(),
            pass: AlgoPass::new("Contrast", shaders::CONTRAST_FRAG),
        }
    }

    /// The values pushed as uniforms on the next pass.
    pub fn params(&self) -> ContrastParams {
        self.params
    }
}

impl Filter for ContrastFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Contrast
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "contrast" => {
                self.params.contrast = expect_number("Contrast", key, value)?;
                Ok(())
            }
            _ => Err(unknown_param("Contrast", key)),
        }
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let p = self.params;
        self.pass.run(ctx, data, |gl, prog| {
            prog.set_f32(gl, "u_contrast", p.contrast);
        })
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.pass.destroy(gl);
    }

    impl_as_any!();
}

/// Nominal range 0.0 (greyscale) to 2.0; 1.0 is identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationParams {
    pub saturation: f32,
}

impl Default for SaturationParams {
    fn default() -> Self {
        Self { saturation: 1.0 }
    }
}

#[derive(Debug)]
pub struct SaturationFilter {
    params: SaturationParams,
    pass: AlgoPass,
}

impl Default for SaturationFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturationFilter {
    pub fn new() -> Self {
        Self {
            params: SaturationParams::default(),
            pass: AlgoPass::new("Saturation", shaders::SATURATION_FRAG),
        }
    }

    pub fn params(&self) -> SaturationParams {
        self.params
    }
}

impl Filter for SaturationFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Saturation
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "saturation" => {
                self.params.saturation = expect_number("Saturation", key, value)?;
                Ok(())
            }
            _ => Err(unknown_param("Saturation", key)),
        }
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let p = self.params;
        self.pass.run(ctx, data, |gl, prog| {
            prog.set_f32(gl, "u_saturation", p.saturation);
        })
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.pass.destroy(gl);
    }

    impl_as_any!();
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrightnessParams {
    /// Added to every channel; nominal range -1.0 to 1.0.
    pub brightness: f32,
}

#[derive(Debug)]
pub struct BrightnessFilter {
    params: BrightnessParams,
    pass: AlgoPass,
}

impl Default for BrightnessFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BrightnessFilter {
    pub fn new() -> Self {
        Self {
            params: BrightnessParams::default(),
            pass: AlgoPass::new("Brightness", shaders::BRIGHTNESS_FRAG),
        }
    }

    pub fn params(&self) -> BrightnessParams {
        self.params
    }
}

impl Filter for BrightnessFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Brightness
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "brightness" => {
                self.params.brightness = expect_number("Brightness", key, value)?;
                Ok(())
            }
            _ => Err(unknown_param("Brightness", key)),
        }
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let p = self.params;
        self.pass.run(ctx, data, |gl, prog| {
            prog.set_f32(gl, "u_brightness", p.brightness);
        })
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.pass.destroy(gl);
    }

    impl_as_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfx_graph::FilterKind;

    #[test]
    fn contrast_values_are_observable_without_a_context() {
        let mut f = ContrastFilter::new();
        assert_eq!(f.params().contrast, 1.0);
        for v in [0.0, 0.5, 1.0] {
            f.set_value("contrast", &ParamValue::Number(v)).unwrap();
            assert_eq!(f.params().contrast, v);
        }
        assert_eq!(f.kind(), FilterKind::Algo);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut f = SaturationFilter::new();
        let err = f
            .set_value("contrast", &ParamValue::Number(2.0))
            .expect_err("saturation does not take contrast");
        assert!(matches!(err, EngineError::UnknownParam { .. }));
        assert_eq!(f.params(), SaturationParams::default());
    }

    #[test]
    fn wrong_value_types_are_rejected() {
        let mut f = BrightnessFilter::new();
        let err = f
            .set_value("brightness", &ParamValue::Text("bright".into()))
            .expect_err("text is not a number");
        assert!(matches!(err, EngineError::InvalidParam { .. }));
        let err = f
            .set_value("brightness", &ParamValue::Number(f32::NAN))
            .expect_err("NaN");
        assert!(matches!(err, EngineError::InvalidParam { .. }));
        assert_eq!(f.params().brightness, 0.0);
    }
}
