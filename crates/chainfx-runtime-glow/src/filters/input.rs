use std::path::PathBuf;

use chainfx_core::pixels::decode_file;
use chainfx_core::{ImageFormat, ParamValue, PixelMap};
use chainfx_graph::FilterType;

use crate::filter::{expect_number, expect_text, impl_as_any, unknown_param, Filter};
use crate::process::{ProcessData, RenderCtx};
use crate::targets::upload_rgba;
use crate::EngineError;

/// How an `Input` interprets its `src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `src` is a path decoded through the image codec.
    File(ImageFormat),
    /// `src` is an already-decoded `PixelMap`.
    PixelMap,
    /// `src` is raw RGBA8 bytes sized by `bufferWidth` x `bufferHeight`.
    Buffer,
}

impl InputFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pixelMap" => Some(InputFormat::PixelMap),
            "buffer" => Some(InputFormat::Buffer),
            other => ImageFormat::from_tag(other).map(InputFormat::File),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum InputSource {
    Path(PathBuf),
    Pixels(PixelMap),
    Buffer(Vec<u8>),
}

/// Chain root: puts the source image into `src_texture` and sets the chain's size.
#[derive(Debug, Default)]
pub struct InputFilter {
    format: Option<InputFormat>,
    src: Option<InputSource>,
    buffer_width: u32,
    buffer_height: u32,
}

impl InputFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&self) -> Option<InputFormat> {
        self.format
    }

    /// Programmatic shorthand for `format = "pixelMap"` plus `src`.
    pub fn with_pixel_map(pixels: PixelMap) -> Self {
        Self {
            format: Some(InputFormat::PixelMap),
            src: Some(InputSource::Pixels(pixels)),
            ..Self::default()
        }
    }

    /// Size of the source once loaded, if it is known without decoding.
    pub fn declared_size(&self) -> Option<(u32, u32)> {
        match (&self.format, &self.src) {
            (Some(InputFormat::PixelMap), Some(InputSource::Pixels(pm))) => {
                Some((pm.width(), pm.height()))
            }
            (Some(InputFormat::Buffer), Some(InputSource::Buffer(_))) => {
                Some((self.buffer_width, self.buffer_height))
            }
            _ => None,
        }
    }

    /// Resolve `src` to pixels according to `format`.
    pub fn load(&self) -> Result<PixelMap, EngineError> {
        let format = self
            .format
            .ok_or_else(|| EngineError::UnknownFormat(String::new()))?;

        match (format, &self.src) {
            (_, None) => Err(EngineError::NullSource),
            (InputFormat::File(_), Some(InputSource::Path(p))) => Ok(decode_file(p)?),
            (InputFormat::PixelMap, Some(InputSource::Pixels(pm))) => {
                if pm.is_empty() {
                    Err(EngineError::NullSource)
                } else {
                    Ok(pm.clone())
                }
            }
            (InputFormat::Buffer, Some(InputSource::Buffer(bytes))) => {
                if self.buffer_width == 0 || self.buffer_height == 0 {
                    return Err(EngineError::DecodeFailed(
                        "buffer input needs bufferWidth and bufferHeight".into(),
                    ));
                }
                Ok(PixelMap::from_rgba(
                    self.buffer_width,
                    self.buffer_height,
                    bytes.clone(),
                )?)
            }
            (format, Some(_)) => Err(EngineError::InvalidParam {
                filter: "Input",
                key: "src".into(),
                msg: format!("source does not match format {format:?}"),
            }),
        }
    }
}

impl Filter for InputFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Input
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "format" => {
                let tag = expect_text("Input", key, value)?;
                let format =
                    InputFormat::from_tag(tag).ok_or_else(|| EngineError::UnknownFormat(tag.into()))?;
                self.format = Some(format);
            }
            "src" => {
                self.src = Some(match value {
                    ParamValue::Text(p) => InputSource::Path(PathBuf::from(p)),
                    ParamValue::Pixels(pm) => InputSource::Pixels(pm.clone()),
                    ParamValue::Buffer {
                        bytes,
                        width,
                        height,
                    } => {
                        if *width > 0 && *height > 0 {
                            self.buffer_width = *width;
                            self.buffer_height = *height;
                        }
                        InputSource::Buffer(bytes.clone())
                    }
                    other => {
                        return Err(EngineError::InvalidParam {
                            filter: "Input",
                            key: key.into(),
                            msg: format!("cannot use a {} as a source", other.type_name()),
                        })
                    }
                });
            }
            "bufferWidth" => self.buffer_width = expect_dimension(key, value)?,
            "bufferHeight" => self.buffer_height = expect_dimension(key, value)?,
            _ => return Err(unknown_param("Input", key)),
        }
        Ok(())
    }

    /// Runs regardless of the incoming size: this is where the size comes from.
    unsafe fn process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<bool, EngineError> {
        self.do_process(ctx, data)?;
        Ok(data.has_size())
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        let pixels = self.load().map_err(|e| {
            tracing::warn!(error = %e, "Input: no image loaded");
            e
        })?;

        data.width = pixels.width() as i32;
        data.height = pixels.height() as i32;
        upload_rgba(ctx.gl, data.src_texture, data.width, data.height, pixels.bytes());
        tracing::debug!(w = data.width, h = data.height, "Input: uploaded source");
        Ok(())
    }

    impl_as_any!();
}

fn expect_dimension(key: &str, value: &ParamValue) -> Result<u32, EngineError> {
    let v = expect_number("Input", key, value)?;
    if v < 0.0 || v.fract() != 0.0 {
        return Err(EngineError::InvalidParam {
            filter: "Input",
            key: key.into(),
            msg: format!("{v} is not a pixel count"),
        });
    }
    Ok(v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfx_graph::FilterKind;

    #[test]
    fn reports_input_kind() {
        let f = InputFilter::new();
        assert_eq!(f.kind(), FilterKind::Input);
        assert_ne!(f.kind(), FilterKind::Algo);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let mut f = InputFilter::new();
        let err = f
            .set_value("format", &ParamValue::Text("image/gif".into()))
            .expect_err("gif");
        assert!(matches!(err, EngineError::UnknownFormat(_)));
        assert_eq!(f.format(), None);
    }

    #[test]
    fn missing_source_is_a_null_source() {
        let mut f = InputFilter::new();
        f.set_value("format", &"pixelMap".into()).unwrap();
        assert!(matches!(f.load(), Err(EngineError::NullSource)));
    }

    #[test]
    fn pixel_map_source_loads_as_is() {
        let pm = PixelMap::new_blank(512, 512);
        let mut f = InputFilter::new();
        f.set_value("format", &"pixelMap".into()).unwrap();
        f.set_value("src", &ParamValue::Pixels(pm.clone())).unwrap();
        assert_eq!(f.declared_size(), Some((512, 512)));
        assert_eq!(f.load().unwrap(), pm);
    }

    #[test]
    fn buffer_source_uses_declared_dimensions() {
        let mut f = InputFilter::new();
        f.set_value("format", &"buffer".into()).unwrap();
        f.set_value("bufferWidth", &ParamValue::Number(2.0)).unwrap();
        f.set_value("bufferHeight", &ParamValue::Number(1.0)).unwrap();
        f.set_value(
            "src",
            &ParamValue::Buffer {
                bytes: vec![1, 2, 3, 4, 5, 6, 7, 8],
                width: 0,
                height: 0,
            },
        )
        .unwrap();
        let pm = f.load().unwrap();
        assert_eq!((pm.width(), pm.height()), (2, 1));

        f.set_value("bufferWidth", &ParamValue::Number(3.0)).unwrap();
        assert!(matches!(f.load(), Err(EngineError::DecodeFailed(_))));
    }

    #[test]
    fn undecodable_file_is_a_decode_failure() {
        let mut f = InputFilter::new();
        f.set_value("format", &"image/png".into()).unwrap();
        f.set_value("src", &"/no/such/image.png".into()).unwrap();
        assert!(matches!(f.load(), Err(EngineError::DecodeFailed(_))));
    }

    #[test]
    fn mismatched_source_and_format_is_rejected() {
        let mut f = InputFilter::new();
        f.set_value("format", &"buffer".into()).unwrap();
        f.set_value("src", &"a.png".into()).unwrap();
        assert!(matches!(f.load(), Err(EngineError::InvalidParam { .. })));
    }
}
