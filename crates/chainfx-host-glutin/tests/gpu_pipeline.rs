//! End-to-end renders against a real GL 3.3 context.
//!
//! Needs a display (or an EGL/GLX pbuffer-capable driver), so it is ignored by default:
//!
//!     cargo test -p chainfx-host-glutin -- --ignored
//!
//! winit allows one event loop per process, so every scenario shares one context and runs
//! from a single test.

use chainfx_graph::NodeId;
use chainfx_host_glutin::{ContextManager, SurfaceMode};
use chainfx_runtime_glow::filters::{GaussianBlurFilter, InputFilter, OutputFilter, OutputFormat};
use chainfx_runtime_glow::{shaders, Builder, Filter, FilterGraph, ImageChain, PixelMap, Program};

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelMap {
    let bytes = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    PixelMap::from_rgba(width, height, bytes).unwrap()
}

fn linear_chain(
    pixels: PixelMap,
    middle: Vec<(&str, Box<dyn Filter>)>,
    out: OutputFormat,
) -> ImageChain {
    let mut g = FilterGraph::new();
    let input = g.add("in", Box::new(InputFilter::with_pixel_map(pixels))).unwrap();
    let mut prev: NodeId = input;
    for (name, f) in middle {
        let id = g.add(name, f).unwrap();
        g.connect(prev, id).unwrap();
        prev = id;
    }
    let output = g.add("out", Box::new(OutputFilter::with_format(out))).unwrap();
    g.connect(prev, output).unwrap();
    g.into_chain(vec![input])
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tol)
}

unsafe fn passthrough_keeps_size_and_colour(gl: &glow::Context) {
    let colour = [200, 40, 90, 255];
    let mut chain = linear_chain(solid(512, 512, colour), Vec::new(), OutputFormat::PixelMap);

    assert!(chain.render(gl), "passthrough chain should render");
    let pm = chain.output().and_then(|o| o.pixel_map()).expect("pixel map output");
    assert_eq!((pm.width(), pm.height()), (512, 512));
    assert!(close(pm.pixel(256, 256).unwrap(), colour, 1));

    chain.destroy(gl);
}

unsafe fn buffer_output_is_tightly_packed(gl: &glow::Context) {
    let mut chain = linear_chain(
        solid(64, 32, [10, 20, 30, 255]),
        Vec::new(),
        OutputFormat::Buffer,
    );

    assert!(chain.render(gl));
    let buf = chain.output().and_then(|o| o.color_buffer()).expect("buffer output");
    assert_eq!(buf.len(), 64 * 32 * 4);

    chain.destroy(gl);
}

unsafe fn programs_compile_and_recompile(gl: &glow::Context) {
    let mut p = Program::new();
    p.compile(gl, shaders::VERTEX, shaders::PASSTHROUGH_FRAG).unwrap();
    assert!(p.is_linked());
    assert!(p.log().is_empty());
    let first = p.id();

    p.compile(gl, shaders::VERTEX, shaders::CONTRAST_FRAG).unwrap();
    assert!(p.is_linked());
    assert_ne!(first, p.id());

    let err = p.compile(gl, shaders::VERTEX, "#version 330 core\nvoid main() { nope }");
    assert!(err.is_err());
    assert!(!p.is_linked());
    assert!(!p.log().is_empty());

    p.delete(gl);
}

unsafe fn gaussian_blur_restores_size(gl: &glow::Context) {
    let colour = [120, 120, 120, 255];
    let mut chain = linear_chain(
        solid(200, 120, colour),
        vec![("blur", Box::new(GaussianBlurFilter::new()) as Box<dyn Filter>)],
        OutputFormat::PixelMap,
    );

    assert!(chain.render(gl));
    let pm = chain.output().and_then(|o| o.pixel_map()).expect("pixel map output");
    assert_eq!((pm.width(), pm.height()), (200, 120));
    // A flat image stays flat under a normalised kernel.
    assert!(close(pm.pixel(100, 60).unwrap(), colour, 3));

    // Rendering again reuses the chain's textures and programs.
    assert!(chain.render(gl));
    chain.destroy(gl);
}

unsafe fn chain_without_inputs_does_not_render(gl: &glow::Context) {
    let mut g = FilterGraph::new();
    g.add("out", Box::new(OutputFilter::with_format(OutputFormat::PixelMap)))
        .unwrap();
    let mut chain = ImageChain::new(g, Vec::new());
    assert!(!chain.render(gl));
    chain.destroy(gl);
}

unsafe fn file_chain_writes_png(gl: &glow::Context) {
    let dir = std::env::temp_dir();
    let src = dir.join("chainfx_gpu_src.png");
    let dst = dir.join("chainfx_gpu_dst.png");
    chainfx_core::encode_file(
        &solid(32, 16, [0, 255, 0, 255]),
        &src,
        chainfx_core::ImageFormat::Png,
        100,
    )
    .unwrap();

    let json = file_chain_json(&src, &dst);
    let mut chain = Builder::try_create_from_str(&json).unwrap();
    assert!(chain.render(gl));
    assert_eq!(chain.output().and_then(|o| o.written_path()), Some(dst.as_path()));

    let back = chainfx_core::decode_file(&dst).unwrap();
    assert_eq!((back.width(), back.height()), (32, 16));

    chain.destroy(gl);
    let _ = std::fs::remove_file(src);
    let _ = std::fs::remove_file(dst);
}

fn file_chain_json(src: &std::path::Path, dst: &std::path::Path) -> String {
    format!(
        r#"{{
  "filters": [
    {{ "type": "Input", "name": "in", "params": {{ "format": "png", "src": {src:?} }} }},
    {{ "type": "Contrast", "name": "c", "params": {{ "contrast": 1.0 }} }},
    {{ "type": "Output", "name": "out", "params": {{ "format": "png", "dst": {dst:?} }} }}
  ],
  "connections": [ {{ "from": "in", "to": "c" }}, {{ "from": "c", "to": "out" }} ]
}}"#,
        src = src.display().to_string(),
        dst = dst.display().to_string(),
    )
}

#[test]
#[ignore = "requires a GL 3.3 capable display"]
fn gpu_pipeline_end_to_end() {
    let mut ctx = ContextManager::new(SurfaceMode::Pbuffer {
        width: 16,
        height: 16,
    });
    ctx.init().expect("GL context");
    // Second init is a no-op.
    let gl = ctx.init().expect("GL context (again)");

    unsafe {
        passthrough_keeps_size_and_colour(gl);
        buffer_output_is_tightly_packed(gl);
        programs_compile_and_recompile(gl);
        gaussian_blur_restores_size(gl);
        chain_without_inputs_does_not_render(gl);
        file_chain_writes_png(gl);
    }

    ctx.shutdown();
    assert!(!ctx.is_initialized());
}
