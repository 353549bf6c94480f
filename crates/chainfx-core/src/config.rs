//! Declarative chain description (JSON).
//!
//! ```json
//! {
//!   "filters": [
//!     { "type": "Input",    "name": "in",  "params": { "format": "image/png", "src": "a.png" } },
//!     { "type": "Contrast", "name": "c",   "params": { "contrast": 1.4 } },
//!     { "type": "Output",   "name": "out", "params": { "format": "image/png", "dst": "b.png" } }
//!   ],
//!   "connections": [ { "from": "in", "to": "c" }, { "from": "c", "to": "out" } ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::param::ParamValue;

/// Longest config path accepted (bytes). Mirrors Linux `PATH_MAX`.
pub const MAX_CONFIG_PATH_LEN: usize = 4096;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub filters: Option<Vec<FilterDecl>>,
    #[serde(default)]
    pub connections: Option<Vec<ConnectionDecl>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterDecl {
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionDecl {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl FilterDecl {
    /// Parameters in document order. Values that are not numbers, strings or numeric
    /// arrays are returned as `Err(key)` so the caller can log them.
    pub fn param_values(&self) -> Vec<Result<(String, ParamValue), String>> {
        let Some(params) = &self.params else {
            return Vec::new();
        };
        params
            .iter()
            .map(|(k, v)| ParamValue::from_json(v).map(|pv| (k.clone(), pv)).ok_or(k.clone()))
            .collect()
    }
}

impl ConnectionDecl {
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match (&self.from, &self.to) {
            (Some(f), Some(t)) => Some((f.as_str(), t.as_str())),
            _ => None,
        }
    }
}

impl ChainConfig {
    pub fn filters(&self) -> &[FilterDecl] {
        self.filters.as_deref().unwrap_or(&[])
    }

    pub fn connections(&self) -> &[ConnectionDecl] {
        self.connections.as_deref().unwrap_or(&[])
    }
}

/// Parse an in-memory document. `origin` is only used for error messages.
pub fn parse_chain_config(text: &str, origin: &Path) -> Result<ChainConfig, EngineError> {
    serde_json::from_str(text).map_err(|source| EngineError::Json {
        path: origin.to_path_buf(),
        source,
    })
}

/// Resolve, bounds-check, read and parse a config file.
pub fn load_chain_config(path: impl AsRef<Path>) -> Result<ChainConfig, EngineError> {
    let path = path.as_ref();
    let real = resolve_config_path(path)?;
    let text = fs::read_to_string(&real).map_err(|source| EngineError::Io {
        path: real.clone(),
        source,
    })?;
    parse_chain_config(&text, &real)
}

pub fn resolve_config_path(path: &Path) -> Result<PathBuf, EngineError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(EngineError::invalid_config(path, "empty path"));
    }
    if raw.len() > MAX_CONFIG_PATH_LEN {
        return Err(EngineError::PathTooLong {
            len: raw.len(),
            max: MAX_CONFIG_PATH_LEN,
        });
    }
    let real = path.canonicalize().map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if real.as_os_str().len() > MAX_CONFIG_PATH_LEN {
        return Err(EngineError::PathTooLong {
            len: real.as_os_str().len(),
            max: MAX_CONFIG_PATH_LEN,
        });
    }
    Ok(real)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        let err = load_chain_config("").expect_err("empty path");
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn overlong_path_is_rejected_before_touching_disk() {
        let long = "a".repeat(MAX_CONFIG_PATH_LEN + 1);
        let err = load_chain_config(&long).expect_err("too long");
        assert!(matches!(err, EngineError::PathTooLong { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_chain_config("/no/such/chain.json").expect_err("missing");
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn params_are_optional_and_arrays_keep_length() {
        let cfg = parse_chain_config(
            r#"{
                "filters": [
                    { "type": "Input", "name": "in" },
                    { "type": "HorizontalBlur", "name": "h", "params": { "weight": [0.2, 0.3, 0.1], "bad": true } }
                ],
                "connections": [ { "from": "in", "to": "h" }, { "from": "in" } ]
            }"#,
            Path::new("<inline>"),
        )
        .expect("parse");

        assert!(cfg.filters()[0].param_values().is_empty());
        let params = cfg.filters()[1].param_values();
        assert_eq!(params.len(), 2);
        let (key, weight) = params[0].as_ref().expect("weight converts");
        assert_eq!(key, "weight");
        assert_eq!(weight.count(), 3);
        assert_eq!(params[1], Err("bad".to_string()));

        assert_eq!(cfg.connections()[0].endpoints(), Some(("in", "h")));
        assert_eq!(cfg.connections()[1].endpoints(), None);
    }

    #[test]
    fn params_follow_document_order() {
        let cfg = parse_chain_config(
            r#"{
                "filters": [
                    { "type": "Input", "name": "in", "params": { "src": "a.png", "format": "png", "bufferWidth": 4 } }
                ]
            }"#,
            Path::new("<inline>"),
        )
        .expect("parse");

        let keys: Vec<String> = cfg.filters()[0]
            .param_values()
            .into_iter()
            .map(|p| p.expect("converts").0)
            .collect();
        assert_eq!(keys, ["src", "format", "bufferWidth"]);
    }

    #[test]
    fn non_object_documents_fail_to_parse() {
        let err = parse_chain_config("[1, 2]", Path::new("<inline>")).expect_err("array root");
        assert!(matches!(err, EngineError::Json { .. }));
    }
}
