use std::collections::HashMap;

use chainfx_graph::{FilterKind, Graph, NodeId, Plan};

use crate::filter::Filter;
use crate::filters::OutputFilter;
use crate::mesh::Mesh;
use crate::process::RenderCtx;
use crate::targets::ChainTargets;
use crate::EngineError;

/// Named filters plus their single-link wiring.
///
/// This is what the builder produces and what programmatic callers assemble by hand before
/// handing it to an `ImageChain`.
#[derive(Debug, Default)]
pub struct FilterGraph {
    graph: Graph,
    filters: HashMap<NodeId, Box<dyn Filter>>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, filter: Box<dyn Filter>) -> Result<NodeId, EngineError> {
        let id = self.graph.add_node(filter.filter_type(), name)?;
        self.filters.insert(id, filter);
        Ok(id)
    }

    /// Wire `from → to`. Relinking `from` detaches its previous successor.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        if let Some(old) = self.graph.next_filter(from) {
            if old != to {
                tracing::warn!(
                    from = %self.name(from).unwrap_or("?"),
                    old = %self.name(old).unwrap_or("?"),
                    "relinking filter; previous successor detached"
                );
                self.graph.add_previous_filter(old, None)?;
            }
        }
        if let Some(old) = self.graph.previous_filter(to) {
            if old != from {
                self.graph.add_next_filter(old, None)?;
            }
        }
        self.graph.connect(from, to)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.graph.find_by_name(name)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.graph.node(id).map(|n| n.name.as_str())
    }

    pub fn filter(&self, id: NodeId) -> Option<&dyn Filter> {
        self.filters.get(&id).map(|f| f.as_ref())
    }

    pub fn filter_mut(&mut self, id: NodeId) -> Option<&mut (dyn Filter + 'static)> {
        self.filters.get_mut(&id).map(|f| f.as_mut())
    }

    /// Typed access to a filter by name.
    pub fn get<T: Filter>(&self, name: &str) -> Option<&T> {
        self.filter(self.find(name)?)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Filter>(&mut self, name: &str) -> Option<&mut T> {
        let id = self.find(name)?;
        self.filter_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Hand the graph to an `ImageChain` rooted at `inputs`.
    pub fn into_chain(self, inputs: Vec<NodeId>) -> ImageChain {
        ImageChain::new(self, inputs)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        for f in self.filters.values_mut() {
            f.destroy(gl);
        }
    }
}

#[derive(Debug)]
struct ChainGpu {
    mesh: Mesh,
    targets: ChainTargets,
}

/// Executes a filter graph from its single `Input` root.
///
/// The mesh, two ping-pong textures and one framebuffer are shared by every filter of the
/// chain. They are created on the first render (or eagerly via [`ImageChain::with_context`])
/// and released by [`ImageChain::destroy`].
#[derive(Debug)]
pub struct ImageChain {
    filters: FilterGraph,
    inputs: Vec<NodeId>,
    gpu: Option<ChainGpu>,
}

impl ImageChain {
    pub fn new(filters: FilterGraph, inputs: Vec<NodeId>) -> Self {
        Self {
            filters,
            inputs,
            gpu: None,
        }
    }

    /// Like `new`, but allocates the shared GPU objects immediately.
    pub unsafe fn with_context(
        gl: &glow::Context,
        filters: FilterGraph,
        inputs: Vec<NodeId>,
    ) -> Result<Self, EngineError> {
        let mut chain = Self::new(filters, inputs);
        chain.ensure_gpu(gl)?;
        Ok(chain)
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn filters(&self) -> &FilterGraph {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterGraph {
        &mut self.filters
    }

    pub fn filter_by_name<T: Filter>(&self, name: &str) -> Option<&T> {
        self.filters.get(name)
    }

    pub fn filter_by_name_mut<T: Filter>(&mut self, name: &str) -> Option<&mut T> {
        self.filters.get_mut(name)
    }

    /// Execution order. Only a single root is supported; zero or several roots is a
    /// `Cardinality` error.
    pub fn plan(&self) -> Result<Plan, EngineError> {
        if self.inputs.len() != 1 {
            return Err(EngineError::Cardinality {
                roots: self.inputs.len(),
            });
        }
        self.filters.graph().compile(&self.inputs)
    }

    /// The `Output` at the end of the root's chain, if there is one.
    pub fn output(&self) -> Option<&OutputFilter> {
        let plan = self.plan().ok()?;
        let last = *plan.chains.first()?.last()?;
        self.filters.filter(last)?.as_any().downcast_ref()
    }

    unsafe fn ensure_gpu(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        if self.gpu.is_none() {
            let mut targets = ChainTargets::new(gl)?;
            let mesh = match Mesh::new(gl) {
                Ok(m) => m,
                Err(e) => {
                    targets.destroy(gl);
                    return Err(e);
                }
            };
            self.gpu = Some(ChainGpu { mesh, targets });
        }
        Ok(())
    }

    /// Run the chain once. The GL context must be current on this thread.
    pub unsafe fn try_render(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        let plan = self.plan()?;
        self.ensure_gpu(gl)?;
        let Some(gpu) = self.gpu.as_ref() else {
            return Err(EngineError::other("render: GPU resources missing"));
        };

        let ctx = RenderCtx {
            gl,
            mesh: &gpu.mesh,
        };
        let mut data = gpu.targets.process_data();

        for id in &plan.chains[0] {
            let name = self.filters.name(*id).unwrap_or("?").to_string();
            let filter = self
                .filters
                .filter_mut(*id)
                .ok_or_else(|| EngineError::other(format!("render: filter '{name}' missing")))?;

            if filter.kind() == FilterKind::Merge {
                return Err(EngineError::other(format!(
                    "render: '{name}' is a merge node; merging is not supported"
                )));
            }

            let ran = filter.process(&ctx, &mut data).map_err(|e| {
                tracing::error!(filter = %name, error = %e, "render: stage failed");
                e
            })?;
            if !ran {
                return Err(EngineError::other(format!(
                    "render: '{name}' received an empty image"
                )));
            }
            tracing::trace!(filter = %name, w = data.width, h = data.height, "stage done");
        }
        Ok(())
    }

    /// `true` on success; failures are logged.
    pub unsafe fn render(&mut self, gl: &glow::Context) -> bool {
        match self.try_render(gl) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "image chain render failed");
                false
            }
        }
    }

    /// Release every GL object owned by the chain and its filters.
    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.filters.destroy(gl);
        if let Some(mut gpu) = self.gpu.take() {
            gpu.mesh.delete(gl);
            gpu.targets.destroy(gl);
        }
    }
}
