//! Method keys and descriptors
//!
//! A descriptor aggregates every layer declared for one (model, method)
//! pair. Layers form a singly linked chain from the most recently declared
//! one down to the first, which has no successor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::errors::{MethodError, MethodResult};
use super::layer::{Layer, LayerId};
use super::signature::Signature;

/// Identifies one overridable method slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey {
    pub model: String,
    pub name: String,
}

impl MethodKey {
    pub fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
        }
    }

    /// `model.method()` form used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}()", self.model, self.name)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.name)
    }
}

/// Per-method record of the declared signature and the layer chain
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    key: MethodKey,
    signature: Signature,
    top_layer: Arc<Layer>,
    /// Layer -> the layer it overrides, `None` for the first one
    next_layer: HashMap<LayerId, Option<Arc<Layer>>>,
}

impl MethodDescriptor {
    /// Create a descriptor with `layer` as its only layer
    pub(crate) fn new(layer: Arc<Layer>) -> Self {
        let mut next_layer = HashMap::new();
        next_layer.insert(layer.id(), None);
        Self {
            key: layer.key().clone(),
            signature: layer.signature().clone(),
            top_layer: layer,
            next_layer,
        }
    }

    /// Push `layer` on top of the chain.
    ///
    /// The descriptor is left untouched when the signature differs.
    pub(crate) fn push_layer(&mut self, layer: Arc<Layer>) -> MethodResult<()> {
        self.signature.ensure_matches(layer.signature())?;
        let previous = Arc::clone(&self.top_layer);
        self.next_layer.insert(layer.id(), Some(previous));
        self.top_layer = layer;
        Ok(())
    }

    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Most recently declared layer
    pub fn top_layer(&self) -> &Arc<Layer> {
        &self.top_layer
    }

    /// The layer `layer` overrides, or `None` if it is the first one
    pub fn next_layer(&self, layer: LayerId) -> MethodResult<Option<Arc<Layer>>> {
        self.next_layer
            .get(&layer)
            .cloned()
            .ok_or_else(|| MethodError::UnknownLayer(format!("{} in {}", layer, self.key)))
    }

    /// Number of declarations made for this method
    pub fn layer_count(&self) -> usize {
        self.next_layer.len()
    }

    /// Layers from the most recent to the first declared
    pub fn layers(&self) -> Vec<Arc<Layer>> {
        let mut layers = Vec::with_capacity(self.next_layer.len());
        let mut current = Some(Arc::clone(&self.top_layer));
        while let Some(layer) = current {
            current = self.next_layer.get(&layer.id()).cloned().flatten();
            layers.push(layer);
        }
        layers
    }
}
