//! Concrete filters.

pub mod blur;
pub mod color;
pub mod input;
pub mod output;
pub mod scale;

pub use blur::{BlurAxis, BlurFilter, BlurParams, GaussianBlurFilter};
pub use color::{
    BrightnessFilter, BrightnessParams, ContrastFilter, ContrastParams, SaturationFilter,
    SaturationParams,
};
pub use input::{InputFilter, InputFormat};
pub use output::{OutputFilter, OutputFormat};
pub use scale::{ScaleFilter, ScaleParams};
