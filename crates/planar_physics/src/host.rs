//! Interfaces to the host application
//!
//! The binding never owns render objects. It reaches them through
//! [`RenderTargets`], and it identifies the render objects that own a World
//! by a [`TypeTag`] handed out once at setup by a [`TypeRegistry`].

use planar_math::Mat4;
use serde::{Serialize, Deserialize};

/// Opaque tag identifying one kind of host object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag(u32);

impl TypeTag {
    /// Raw tag value
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Hands out unique type tags
///
/// Created by the host during setup. Each binding registers itself once and
/// keeps the returned tag, so tests can build as many independent registries
/// as they need.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    names: Vec<String>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new object kind and return its tag
    ///
    /// Registering the same name twice returns the tag issued the first time.
    pub fn register(&mut self, name: &str) -> TypeTag {
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            return TypeTag(idx as u32);
        }
        self.names.push(name.to_string());
        TypeTag((self.names.len() - 1) as u32)
    }

    /// Name a tag was registered under
    pub fn name(&self, tag: TypeTag) -> Option<&str> {
        self.names.get(tag.0 as usize).map(String::as_str)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The live render-object collection, as seen by Transform Sync
pub trait RenderTargets {
    /// Number of live render objects; valid ids are `0..object_count()`
    fn object_count(&self) -> usize;

    /// Model matrix of the render object with this id
    fn model_matrix_mut(&mut self, id: usize) -> Option<&mut Mat4>;
}

/// A host with no render objects at all
impl RenderTargets for () {
    fn object_count(&self) -> usize {
        0
    }

    fn model_matrix_mut(&mut self, _id: usize) -> Option<&mut Mat4> {
        None
    }
}

/// A bare list of model matrices, indexed by render-object id
impl RenderTargets for Vec<Mat4> {
    fn object_count(&self) -> usize {
        self.len()
    }

    fn model_matrix_mut(&mut self, id: usize) -> Option<&mut Mat4> {
        self.get_mut(id)
    }
}
