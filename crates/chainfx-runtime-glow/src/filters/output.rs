use std::path::{Path, PathBuf};

use chainfx_core::pixels::{encode_file, DEFAULT_JPEG_QUALITY};
use chainfx_core::{ImageFormat, ParamValue, PixelMap};
use chainfx_graph::FilterType;

use crate::filter::{expect_number, expect_text, impl_as_any, unknown_param, AlgoPass, Filter};
use crate::process::{ProcessData, RenderCtx};
use crate::shaders;
use crate::targets::read_rgba;
use crate::EngineError;

/// What an `Output` produces after reading the result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Keep a `PixelMap` and also encode it to `dst`.
    File(ImageFormat),
    PixelMap,
    Buffer,
}

impl OutputFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pixelMap" => Some(OutputFormat::PixelMap),
            "buffer" => Some(OutputFormat::Buffer),
            other => ImageFormat::from_tag(other).map(OutputFormat::File),
        }
    }
}

/// Chain sink: reads the rendered image back to CPU memory.
#[derive(Debug)]
pub struct OutputFilter {
    format: Option<OutputFormat>,
    dst: Option<PathBuf>,
    quality: u8,
    copy: AlgoPass,
    pixel_map: Option<PixelMap>,
    color_buffer: Option<Vec<u8>>,
    written: Option<PathBuf>,
}

impl Default for OutputFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFilter {
    pub fn new() -> Self {
        Self {
            format: None,
            dst: None,
            quality: DEFAULT_JPEG_QUALITY,
            copy: AlgoPass::new("Output", shaders::PASSTHROUGH_FRAG),
            pixel_map: None,
            color_buffer: None,
            written: None,
        }
    }

    pub fn with_format(format: OutputFormat) -> Self {
        let mut f = Self::new();
        f.format = Some(format);
        f
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Result of the last render for `pixelMap` and file formats.
    pub fn pixel_map(&self) -> Option<&PixelMap> {
        self.pixel_map.as_ref()
    }

    pub fn take_pixel_map(&mut self) -> Option<PixelMap> {
        self.pixel_map.take()
    }

    /// Raw RGBA8 bytes (`width * height * 4`) of the last render for the `buffer` format.
    pub fn color_buffer(&self) -> Option<&[u8]> {
        self.color_buffer.as_deref()
    }

    /// File written by the last render, if any.
    pub fn written_path(&self) -> Option<&Path> {
        self.written.as_deref()
    }

    fn clear_results(&mut self) {
        self.pixel_map = None;
        self.color_buffer = None;
        self.written = None;
    }

    /// Render `src` into the framebuffer and read it back.
    unsafe fn write_to_buffer(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<Vec<u8>, EngineError> {
        self.copy.run(ctx, data, |_, _| {})?;
        // The pass swapped, so the texture just written is `src` and still attached.
        Ok(read_rgba(ctx.gl, data.framebuffer, data.width, data.height))
    }
}

impl Filter for OutputFilter {
    fn filter_type(&self) -> FilterType {
        FilterType::Output
    }

    fn set_value(&mut self, key: &str, value: &ParamValue) -> Result<(), EngineError> {
        match key {
            "format" => {
                let tag = expect_text("Output", key, value)?;
                let format = OutputFormat::from_tag(tag)
                    .ok_or_else(|| EngineError::UnknownFormat(tag.into()))?;
                self.format = Some(format);
            }
            "dst" => {
                self.dst = Some(PathBuf::from(expect_text("Output", key, value)?));
            }
            "quality" => {
                let q = expect_number("Output", key, value)?;
                if !(1.0..=100.0).contains(&q) {
                    return Err(EngineError::InvalidParam {
                        filter: "Output",
                        key: key.into(),
                        msg: format!("{q} is outside 1..=100"),
                    });
                }
                self.quality = q.round() as u8;
            }
            _ => return Err(unknown_param("Output", key)),
        }
        Ok(())
    }

    unsafe fn do_process(
        &mut self,
        ctx: &RenderCtx<'_>,
        data: &mut ProcessData,
    ) -> Result<(), EngineError> {
        self.clear_results();

        let Some(format) = self.format else {
            tracing::warn!("Output: no format set, nothing produced");
            return Err(EngineError::UnknownFormat(String::new()));
        };

        let bytes = self.write_to_buffer(ctx, data)?;
        let (w, h) = (data.width as u32, data.height as u32);

        match format {
            OutputFormat::Buffer => {
                self.color_buffer = Some(bytes);
            }
            OutputFormat::PixelMap => {
                self.pixel_map = Some(PixelMap::from_rgba(w, h, bytes)?);
            }
            OutputFormat::File(image_format) => {
                let pixels = PixelMap::from_rgba(w, h, bytes)?;
                let dst = self.dst.clone().ok_or_else(|| EngineError::InvalidParam {
                    filter: "Output",
                    key: "dst".into(),
                    msg: format!("{} output needs a destination path", image_format.mime()),
                })?;
                encode_file(&pixels, &dst, image_format, self.quality).map_err(|e| {
                    tracing::error!(error = %e, "Output: encode failed");
                    EngineError::from(e)
                })?;
                tracing::info!(path = %dst.display(), w, h, "Output: wrote image");
                self.written = Some(dst);
                self.pixel_map = Some(pixels);
            }
        }
        Ok(())
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.copy.destroy(gl);
    }

    impl_as_any!();
}
