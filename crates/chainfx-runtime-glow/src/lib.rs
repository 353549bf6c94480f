//! chainfx runtime (glow/OpenGL backend)
//
// This crate contains the GPU half of the image pipeline:
// - compile/link shaders, own the full-screen quad
// - share two ping-pong textures + one framebuffer per chain
// - run filters in chain order and read results back
//
// It does NOT create GL contexts or windows; the host makes a context current and passes
// `&glow::Context` into every call.
#![allow(clippy::missing_safety_doc)]
#![deny(missing_debug_implementations)]

pub mod builder;
pub mod factory;
pub mod filter;
pub mod filters;
pub mod image_chain;
pub mod mesh;
pub mod process;
pub mod program;
pub mod shaders;
pub mod targets;

pub use chainfx_core::{EngineError, ParamValue, PixelMap};
pub use chainfx_graph::{FilterKind, FilterType, NodeId};

pub use builder::Builder;
pub use factory::FilterFactory;
pub use filter::{AlgoPass, Filter};
pub use image_chain::{FilterGraph, ImageChain};
pub use mesh::Mesh;
pub use process::{ProcessData, RenderCtx};
pub use program::{compile_program, Program};
pub use targets::ChainTargets;
