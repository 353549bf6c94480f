use chainfx_graph::FilterType;

use crate::filter::Filter;
use crate::EngineError;
use crate::filters::{
    BlurFilter, BrightnessFilter, ContrastFilter, GaussianBlurFilter, InputFilter, OutputFilter,
    SaturationFilter, ScaleFilter,
};

/// Maps filter type names to fresh instances. Every call builds a new filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFactory;

impl FilterFactory {
    /// `None` (and a warning) for names outside the known set.
    pub fn create(name: &str) -> Option<Box<dyn Filter>> {
        match Self::try_create(name) {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::warn!(error = %e, "FilterFactory: no filter created");
                None
            }
        }
    }

    pub fn try_create(name: &str) -> Result<Box<dyn Filter>, EngineError> {
        FilterType::from_name(name)
            .map(Self::create_type)
            .ok_or_else(|| EngineError::UnknownFilterType(name.to_string()))
    }

    pub fn create_type(ty: FilterType) -> Box<dyn Filter> {
        match ty {
            FilterType::Input => Box::new(InputFilter::new()),
            FilterType::Output => Box::new(OutputFilter::new()),
            FilterType::GaussianBlur => Box::new(GaussianBlurFilter::new()),
            FilterType::HorizontalBlur => Box::new(BlurFilter::horizontal()),
            FilterType::VerticalBlur => Box::new(BlurFilter::vertical()),
            FilterType::Scale => Box::new(ScaleFilter::new()),
            FilterType::Saturation => Box::new(SaturationFilter::new()),
            FilterType::Contrast => Box::new(ContrastFilter::new()),
            FilterType::Brightness => Box::new(BrightnessFilter::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_name_builds_a_matching_filter() {
        for ty in FilterType::ALL {
            let f = FilterFactory::create(ty.name()).expect("known type");
            assert_eq!(f.filter_type(), ty);
            assert_eq!(f.kind(), ty.kind());
        }
    }

    #[test]
    fn unknown_names_yield_none() {
        assert!(FilterFactory::create("Sharpen").is_none());
        assert!(FilterFactory::create("").is_none());
        assert!(FilterFactory::create("contrast").is_none());
    }

    #[test]
    fn try_create_names_the_unknown_type() {
        let err = FilterFactory::try_create("Sharpen").expect_err("unknown");
        assert!(matches!(&err, EngineError::UnknownFilterType(n) if n == "Sharpen"));
        assert!(err.to_string().contains("Sharpen"));

        let f = FilterFactory::try_create("GaussianBlur").expect("known");
        assert_eq!(f.filter_type(), FilterType::GaussianBlur);
    }

    #[test]
    fn instances_are_independent() {
        let mut a = FilterFactory::create("Contrast").unwrap();
        let b = FilterFactory::create("Contrast").unwrap();
        a.set_value("contrast", &2.0f32.into()).unwrap();

        let a = a.as_any().downcast_ref::<ContrastFilter>().unwrap();
        let b = b.as_any().downcast_ref::<ContrastFilter>().unwrap();
        assert_eq!(a.params().contrast, 2.0);
        assert_eq!(b.params().contrast, 1.0);
    }
}
