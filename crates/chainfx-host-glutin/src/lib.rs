//! Host glue (policy layer): GL context creation.
//!
//! The runtime never creates contexts itself. A [`ContextManager`] owns the display, context,
//! surface (window or pbuffer) and the `glow` function table, and keeps them current on the
//! thread that initialised it. All GL ids handed out by the runtime are only valid while that
//! context is current.

use std::ffi::CString;
use std::num::NonZeroU32;

use chainfx_core::EngineError;
use glutin::config::{ConfigSurfaceTypes, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, PossiblyCurrentGlContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, PbufferSurface, Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::HasRawWindowHandle;
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::window::{Window, WindowBuilder};

/// GL version requested for every context.
pub const GL_VERSION: (u8, u8) = (3, 3);

/// Where rendering ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceMode {
    /// A visible window; the default framebuffer can be presented.
    Window {
        title: String,
        width: u32,
        height: u32,
    },
    /// Off-screen pixel buffer; nothing is shown.
    Pbuffer { width: u32, height: u32 },
}

impl Default for SurfaceMode {
    fn default() -> Self {
        SurfaceMode::Pbuffer {
            width: 1,
            height: 1,
        }
    }
}

enum HostSurface {
    Window(Surface<WindowSurface>),
    Pbuffer(Surface<PbufferSurface>),
}

struct Live {
    // Field order is drop order: GL table, surface, context, window, event loop.
    gl: glow::Context,
    surface: HostSurface,
    context: PossiblyCurrentContext,
    window: Option<Window>,
    _event_loop: EventLoop<()>,
}

/// Creates and owns the one GL context the pipeline renders with.
pub struct ContextManager {
    mode: SurfaceMode,
    live: Option<Live>,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("mode", &self.mode)
            .field("initialized", &self.live.is_some())
            .finish()
    }
}

impl ContextManager {
    pub fn new(mode: SurfaceMode) -> Self {
        Self { mode, live: None }
    }

    pub fn mode(&self) -> &SurfaceMode {
        &self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    /// Create the context on first call; later calls return the existing one.
    pub fn init(&mut self) -> Result<&glow::Context, EngineError> {
        if self.live.is_none() {
            let live = create_live(&self.mode)?;
            tracing::info!(mode = ?self.mode, "GL context ready");
            self.live = Some(live);
        }
        self.gl()
            .ok_or_else(|| EngineError::Context("context vanished after init".into()))
    }

    pub fn gl(&self) -> Option<&glow::Context> {
        self.live.as_ref().map(|l| &l.gl)
    }

    pub fn is_current(&self) -> bool {
        self.live
            .as_ref()
            .map(|l| l.context.is_current())
            .unwrap_or(false)
    }

    pub fn window(&self) -> Option<&Window> {
        self.live.as_ref().and_then(|l| l.window.as_ref())
    }

    /// Swap buffers for window surfaces; a no-op for pbuffers.
    pub fn present(&self) -> Result<(), EngineError> {
        let Some(live) = &self.live else {
            return Err(EngineError::Context("present before init".into()));
        };
        match &live.surface {
            HostSurface::Window(s) => s
                .swap_buffers(&live.context)
                .map_err(|e| EngineError::Context(format!("swap_buffers: {e}"))),
            HostSurface::Pbuffer(_) => Ok(()),
        }
    }

    /// Drop the context and surface. `init` may be called again afterwards only if the
    /// platform allows a second event loop.
    pub fn shutdown(&mut self) {
        if self.live.take().is_some() {
            tracing::debug!("GL context released");
        }
    }
}

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v.max(1)).unwrap_or(NonZeroU32::MIN)
}

/// The first config with the lowest sample count; single-sampled is enough for offscreen passes.
fn fewest_samples<T>(configs: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    configs.reduce(|best, c| if samples(&c) < samples(&best) { c } else { best })
}

fn build_event_loop() -> EventLoop<()> {
    let mut builder = EventLoopBuilder::new();
    #[cfg(all(
        unix,
        not(target_os = "macos"),
        not(target_os = "ios"),
        not(target_os = "android")
    ))]
    {
        // Tests and worker threads initialise off the main thread.
        winit::platform::x11::EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    builder.build()
}

fn create_live(mode: &SurfaceMode) -> Result<Live, EngineError> {
    let event_loop = build_event_loop();

    let mut template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_depth_size(0)
        .with_stencil_size(0);

    let mut display_builder = glutin_winit::DisplayBuilder::new();
    match mode {
        SurfaceMode::Window {
            title,
            width,
            height,
        } => {
            let wb = WindowBuilder::new()
                .with_title(title.clone())
                .with_inner_size(winit::dpi::PhysicalSize::new(*width, *height));
            display_builder = display_builder.with_window_builder(Some(wb));
        }
        SurfaceMode::Pbuffer { .. } => {
            template = template.with_surface_type(ConfigSurfaceTypes::PBUFFER);
        }
    }

    let (window, gl_config) = display_builder
        .build(&event_loop, template, |configs| {
            // glutin-winit returns an error from `build` before calling the picker when the
            // display has no matching config, so the iterator is never empty here.
            fewest_samples(configs, |c| c.num_samples())
                .expect("glutin only calls the picker with at least one config")
        })
        .map_err(|e| EngineError::Context(format!("DisplayBuilder.build: {e}")))?;

    let gl_display = gl_config.display();
    let raw_window_handle = window.as_ref().map(|w| w.raw_window_handle());

    let context_attributes = ContextAttributesBuilder::new()
        .with_profile(GlProfile::Core)
        .with_context_api(ContextApi::OpenGl(Some(Version::new(
            GL_VERSION.0,
            GL_VERSION.1,
        ))))
        .build(raw_window_handle);

    let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
        .map_err(|e| EngineError::Context(format!("create_context: {e}")))?;

    let (surface, context) = match (mode, &window) {
        (SurfaceMode::Window { .. }, Some(window)) => {
            let size = window.inner_size();
            let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
                window.raw_window_handle(),
                non_zero(size.width),
                non_zero(size.height),
            );
            let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
                .map_err(|e| EngineError::Context(format!("create_window_surface: {e}")))?;
            let context = not_current
                .make_current(&surface)
                .map_err(|e| EngineError::Context(format!("make_current: {e}")))?;
            (HostSurface::Window(surface), context)
        }
        (SurfaceMode::Window { .. }, None) => {
            return Err(EngineError::Context(
                "DisplayBuilder did not create a window".into(),
            ))
        }
        (SurfaceMode::Pbuffer { width, height }, _) => {
            let attrs = SurfaceAttributesBuilder::<PbufferSurface>::new()
                .build(non_zero(*width), non_zero(*height));
            let surface = unsafe { gl_display.create_pbuffer_surface(&gl_config, &attrs) }
                .map_err(|e| EngineError::Context(format!("create_pbuffer_surface: {e}")))?;
            let context = not_current
                .make_current(&surface)
                .map_err(|e| EngineError::Context(format!("make_current: {e}")))?;
            (HostSurface::Pbuffer(surface), context)
        }
    };

    let gl = unsafe {
        glow::Context::from_loader_function(|s| match CString::new(s) {
            Ok(name) => gl_display.get_proc_address(name.as_c_str()) as *const _,
            Err(_) => std::ptr::null(),
        })
    };

    Ok(Live {
        gl,
        surface,
        context,
        window,
        _event_loop: event_loop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_is_lazy() {
        let m = ContextManager::new(SurfaceMode::default());
        assert!(!m.is_initialized());
        assert!(m.gl().is_none());
        assert!(!m.is_current());
        assert!(m.present().is_err());
    }

    #[test]
    fn config_choice_prefers_fewest_samples() {
        let samples = |c: &(u8, &str)| c.0;
        let picked = fewest_samples([(4, "msaa4"), (0, "plain"), (0, "plain2")].into_iter(), samples);
        assert_eq!(picked, Some((0, "plain")));
        assert_eq!(fewest_samples(std::iter::empty::<(u8, &str)>(), samples), None);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        assert_eq!(non_zero(0).get(), 1);
        assert_eq!(non_zero(640).get(), 640);
    }
}
