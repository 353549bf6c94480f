//! chainfx-render: load a chain description, render it once, report the result.
//!
//!     chainfx-render <chain.json> [--window] [--size WxH]
//!
//! Logging follows `RUST_LOG`; the default is `chainfx=info`.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chainfx_host_glutin::{ContextManager, SurfaceMode};
use chainfx_runtime_glow::filters::OutputFormat;
use chainfx_runtime_glow::{Builder, ImageChain};

const USAGE: &str = "usage: chainfx-render <chain.json> [--window] [--size WxH]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    chain: PathBuf,
    window: bool,
    size: (u32, u32),
}

impl Options {
    fn from_args(args: &[String]) -> Result<Self> {
        let mut chain = None;
        let mut window = false;
        let mut size = (640, 480);

        let mut it = args.iter().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--window" => window = true,
                "--size" => {
                    let v = it.next().ok_or_else(|| anyhow!("--size needs WxH\n{USAGE}"))?;
                    size = parse_size(v)?;
                }
                "-h" | "--help" => bail!("{USAGE}"),
                flag if flag.starts_with("--") => bail!("unknown flag '{flag}'\n{USAGE}"),
                path if chain.is_none() => chain = Some(PathBuf::from(path)),
                extra => bail!("unexpected argument '{extra}'\n{USAGE}"),
            }
        }

        let chain = chain.ok_or_else(|| anyhow!("{USAGE}"))?;
        Ok(Self {
            chain,
            window,
            size,
        })
    }

    fn surface_mode(&self) -> SurfaceMode {
        let (width, height) = self.size;
        if self.window {
            SurfaceMode::Window {
                title: format!("chainfx-render: {}", self.chain.display()),
                width,
                height,
            }
        } else {
            SurfaceMode::Pbuffer { width, height }
        }
    }
}

fn parse_size(v: &str) -> Result<(u32, u32)> {
    let (w, h) = v
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size '{v}' is not WxH"))?;
    let w: u32 = w.parse().with_context(|| format!("size width '{w}'"))?;
    let h: u32 = h.parse().with_context(|| format!("size height '{h}'"))?;
    if w == 0 || h == 0 {
        bail!("size '{v}' must be non-zero");
    }
    Ok((w, h))
}

fn report(chain: &ImageChain) {
    let Some(out) = chain.output() else {
        tracing::warn!("chain has no Output; nothing was produced");
        return;
    };
    match out.format() {
        Some(OutputFormat::File(_)) => {
            if let Some(path) = out.written_path() {
                tracing::info!(path = %path.display(), "wrote output image");
            }
        }
        Some(OutputFormat::PixelMap) => {
            if let Some(pm) = out.pixel_map() {
                tracing::info!(w = pm.width(), h = pm.height(), "rendered pixel map");
            }
        }
        Some(OutputFormat::Buffer) => {
            if let Some(buf) = out.color_buffer() {
                tracing::info!(bytes = buf.len(), "rendered colour buffer");
            }
        }
        None => {}
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chainfx=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let opts = Options::from_args(&args)?;
    tracing::info!("chainfx-render v{}", env!("CARGO_PKG_VERSION"));

    let mut chain = Builder::try_create_from_config(&opts.chain)
        .with_context(|| format!("building chain from {}", opts.chain.display()))?;

    let mut ctx = ContextManager::new(opts.surface_mode());
    ctx.init().context("creating GL context")?;
    let gl = ctx.gl().ok_or_else(|| anyhow!("GL context missing after init"))?;

    // Safety: `init` left the context current on this thread.
    let result = unsafe { chain.try_render(gl) };
    if result.is_ok() {
        report(&chain);
        ctx.present()?;
    }
    unsafe { chain.destroy(gl) };
    ctx.shutdown();

    result.context("rendering chain")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("chainfx-render")
            .chain(v.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_path_and_flags() {
        let o =
            Options::from_args(&args(&["chain.json", "--window", "--size", "320x200"])).unwrap();
        assert_eq!(o.chain, PathBuf::from("chain.json"));
        assert!(o.window);
        assert_eq!(o.size, (320, 200));
        assert!(matches!(o.surface_mode(), SurfaceMode::Window { width: 320, .. }));
    }

    #[test]
    fn defaults_to_pbuffer() {
        let o = Options::from_args(&args(&["chain.json"])).unwrap();
        assert_eq!(
            o.surface_mode(),
            SurfaceMode::Pbuffer {
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn rejects_missing_path_and_unknown_flags() {
        assert!(Options::from_args(&args(&[])).is_err());
        assert!(Options::from_args(&args(&["a.json", "--fast"])).is_err());
        assert!(Options::from_args(&args(&["a.json", "b.json"])).is_err());
        assert!(Options::from_args(&args(&["a.json", "--size"])).is_err());
    }

    #[test]
    fn size_must_be_two_positive_numbers() {
        assert_eq!(parse_size("8X4").unwrap(), (8, 4));
        assert!(parse_size("0x4").is_err());
        assert!(parse_size("12").is_err());
        assert!(parse_size("axb").is_err());
    }
}
