use std::path::{Path, PathBuf};

use chainfx_core::{load_chain_config, parse_chain_config, ChainConfig, EngineError};
use chainfx_graph::{FilterKind, NodeId};

use crate::factory::FilterFactory;
use crate::image_chain::{FilterGraph, ImageChain};

/// Turns a declarative chain description into an [`ImageChain`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Builder;

impl Builder {
    /// `None` on any failure; the reason is logged.
    pub fn create_from_config(path: impl AsRef<Path>) -> Option<ImageChain> {
        let path = path.as_ref();
        match Self::try_create_from_config(path) {
            Ok(chain) => Some(chain),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to build image chain");
                None
            }
        }
    }

    pub fn try_create_from_config(path: impl AsRef<Path>) -> Result<ImageChain, EngineError> {
        let path = path.as_ref();
        let cfg = load_chain_config(path)?;
        Self::build(&cfg, path)
    }

    pub fn try_create_from_str(text: &str) -> Result<ImageChain, EngineError> {
        let origin = PathBuf::from("<inline>");
        let cfg = parse_chain_config(text, &origin)?;
        Self::build(&cfg, &origin)
    }

    /// Instantiate filters, apply params, wire connections and collect `Input` roots.
    ///
    /// Per-entry problems (unknown type, bad parameter, unresolvable connection) are logged and
    /// skipped. The build fails only when an array is missing or no `Input` ends up rooted.
    pub fn build(cfg: &ChainConfig, origin: &Path) -> Result<ImageChain, EngineError> {
        let Some(decls) = cfg.filters.as_ref() else {
            return Err(EngineError::invalid_config(origin, "missing 'filters' array"));
        };
        let Some(connections) = cfg.connections.as_ref() else {
            return Err(EngineError::invalid_config(origin, "missing 'connections' array"));
        };

        let mut graph = FilterGraph::new();

        for (i, decl) in decls.iter().enumerate() {
            let (Some(ty), Some(name)) = (decl.ty.as_deref(), decl.name.as_deref()) else {
                tracing::warn!(index = i, "filter entry without 'type' or 'name' skipped");
                continue;
            };
            let Some(mut filter) = FilterFactory::create(ty) else {
                continue;
            };

            for param in decl.param_values() {
                match param {
                    Ok((key, value)) => {
                        if let Err(e) = filter.set_value(&key, &value) {
                            tracing::warn!(filter = name, error = %e, "parameter ignored");
                        }
                    }
                    Err(key) => {
                        tracing::warn!(filter = name, key = %key, "unsupported parameter value ignored");
                    }
                }
            }

            if let Err(e) = graph.add(name, filter) {
                tracing::warn!(filter = name, error = %e, "filter entry skipped");
            }
        }

        let mut roots: Vec<NodeId> = Vec::new();
        for (i, conn) in connections.iter().enumerate() {
            let Some((from, to)) = conn.endpoints() else {
                tracing::warn!(index = i, "connection without 'from' and 'to' skipped");
                continue;
            };
            let Some(from_id) = graph.find(from) else {
                tracing::warn!(from, to, "connection from an undeclared filter skipped");
                continue;
            };

            let from_is_input = graph
                .filter(from_id)
                .map(|f| f.kind() == FilterKind::Input)
                .unwrap_or(false);
            if from_is_input && !roots.contains(&from_id) {
                roots.push(from_id);
            }

            // A dangling `to` still roots its Input; only the link is dropped.
            let Some(to_id) = graph.find(to) else {
                tracing::warn!(from, to, "connection to an undeclared filter; link dropped");
                continue;
            };
            if let Err(e) = graph.connect(from_id, to_id) {
                tracing::warn!(from, to, error = %e, "connection skipped");
            }
        }

        if roots.is_empty() {
            return Err(EngineError::invalid_config(
                origin,
                "no Input filter is connected to anything",
            ));
        }

        tracing::info!(
            filters = graph.graph().len(),
            roots = roots.len(),
            "image chain built"
        );
        Ok(ImageChain::new(graph, roots))
    }
}
