use std::fmt;
use std::path::PathBuf;

use crate::pixels::CodecError;

/// Engine-level errors used across chainfx crates.
///
/// Contract rule: this type lives in `chainfx-core` and is re-exported by the runtime.
#[derive(Debug)]
pub enum EngineError {
    // ---- Config (declarative chains) ----
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    InvalidConfig {
        path: PathBuf,
        msg: String,
    },

    PathTooLong {
        len: usize,
        max: usize,
    },

    // ---- Filters / parameters ----
    UnknownFilterType(String),

    UnknownParam {
        filter: &'static str,
        key: String,
    },

    InvalidParam {
        filter: &'static str,
        key: String,
        msg: String,
    },

    // ---- Input / output adapters ----
    DecodeFailed(String),
    EncodeFailed(String),
    NullSource,
    UnknownFormat(String),

    // ---- Runtime-facing (backend) ----
    VertexCompile(String),
    FragmentCompile(String),
    Link(String),
    GlCreate(String),
    ProgramUnavailable(&'static str),
    Context(String),
    Cardinality {
        roots: usize,
    },

    // ---- Fallback ----
    Other(String),
}

impl EngineError {
    pub fn other<T: Into<String>>(s: T) -> Self {
        EngineError::Other(s.into())
    }

    pub fn invalid_config<T: Into<String>>(path: impl Into<PathBuf>, msg: T) -> Self {
        EngineError::InvalidConfig {
            path: path.into(),
            msg: msg.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Io { path, source } => {
                write!(f, "io error at {}: {}", path.display(), source)
            }
            EngineError::Json { path, source } => {
                write!(f, "json parse error at {}: {}", path.display(), source)
            }
            EngineError::InvalidConfig { path, msg } => {
                write!(f, "invalid config at {}: {}", path.display(), msg)
            }
            EngineError::PathTooLong { len, max } => {
                write!(f, "config path is {len} bytes (limit {max})")
            }

            EngineError::UnknownFilterType(name) => write!(f, "unknown filter type '{name}'"),
            EngineError::UnknownParam { filter, key } => {
                write!(f, "{filter}: unknown parameter '{key}'")
            }
            EngineError::InvalidParam { filter, key, msg } => {
                write!(f, "{filter}: invalid value for '{key}': {msg}")
            }

            EngineError::DecodeFailed(msg) => write!(f, "image decode failed: {msg}"),
            EngineError::EncodeFailed(msg) => write!(f, "image encode failed: {msg}"),
            EngineError::NullSource => write!(f, "no source image was provided"),
            EngineError::UnknownFormat(fmt) => write!(f, "unknown image format '{fmt}'"),

            EngineError::VertexCompile(msg) => write!(f, "vertex shader compile error: {msg}"),
            EngineError::FragmentCompile(msg) => write!(f, "fragment shader compile error: {msg}"),
            EngineError::Link(msg) => write!(f, "program link error: {msg}"),
            EngineError::GlCreate(msg) => write!(f, "backend object creation failed: {msg}"),
            EngineError::ProgramUnavailable(filter) => {
                write!(f, "{filter}: shader program is not linked")
            }
            EngineError::Context(msg) => write!(f, "rendering context error: {msg}"),
            EngineError::Cardinality { roots } => {
                write!(f, "expected exactly one input root, found {roots}")
            }

            EngineError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io { source, .. } => Some(source),
            EngineError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CodecError> for EngineError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Decode { .. } | CodecError::Open { .. } => {
                EngineError::DecodeFailed(e.to_string())
            }
            CodecError::Encode { .. } => EngineError::EncodeFailed(e.to_string()),
            CodecError::SizeMismatch { .. } => EngineError::DecodeFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_offending_key() {
        let e = EngineError::UnknownParam {
            filter: "Contrast",
            key: "gamma".into(),
        };
        assert_eq!(e.to_string(), "Contrast: unknown parameter 'gamma'");
    }

    #[test]
    fn codec_errors_map_onto_adapter_variants() {
        let e: EngineError = CodecError::SizeMismatch {
            expected: 16,
            actual: 3,
        }
        .into();
        assert!(matches!(e, EngineError::DecodeFailed(_)));
    }
}
