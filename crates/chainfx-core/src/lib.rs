#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

//! chainfx core: errors, parameter values, declarative config and pixel buffers.
//!
//! Nothing in here touches the GPU.

pub mod config;
pub mod error;
pub mod param;
pub mod pixels;

pub use config::{
    load_chain_config, parse_chain_config, ChainConfig, ConnectionDecl, FilterDecl,
    MAX_CONFIG_PATH_LEN,
};
pub use error::EngineError;
pub use param::ParamValue;
pub use pixels::{decode_file, encode_file, CodecError, ImageFormat, PixelFormat, PixelMap};
