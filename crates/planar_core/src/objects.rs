//! Render-object collection
//!
//! Objects are addressed by their index. Removing an object shifts every later
//! object down by one, so ids held elsewhere can end up pointing past the end
//! (or at a different object). Physics links tolerate that.

use planar_math::mat4::IDENTITY;
use planar_math::Mat4;
use planar_physics::{RenderTargets, TypeTag, WorldId};

/// One drawable object as far as physics is concerned
#[derive(Clone, Debug, PartialEq)]
pub struct RenderObject {
    /// Object name (for display/lookup)
    pub name: String,
    /// Column-major model matrix
    pub model: Mat4,
    /// Kind of object, if it belongs to a registered binding
    pub type_tag: Option<TypeTag>,
    /// World owned by this object; destroyed along with it
    pub owned_world: Option<WorldId>,
}

impl RenderObject {
    /// Create a plain object with an identity model matrix
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: IDENTITY,
            type_tag: None,
            owned_world: None,
        }
    }

    /// Set the model matrix
    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    /// Mark this object as the owner of a World
    pub fn owning(mut self, tag: TypeTag, world: WorldId) -> Self {
        self.type_tag = Some(tag);
        self.owned_world = Some(world);
        self
    }
}

/// Ordered collection of render objects
#[derive(Clone, Debug, Default)]
pub struct RenderObjects {
    objects: Vec<RenderObject>,
}

impl RenderObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object and return its id
    pub fn spawn(&mut self, object: RenderObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Remove an object; later objects move down one id
    pub fn remove(&mut self, id: usize) -> Option<RenderObject> {
        if id < self.objects.len() {
            Some(self.objects.remove(id))
        } else {
            None
        }
    }

    pub fn get(&self, id: usize) -> Option<&RenderObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut RenderObject> {
        self.objects.get_mut(id)
    }

    /// Id of the first object with this name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name == name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RenderObject)> {
        self.objects.iter().enumerate()
    }
}

impl RenderTargets for RenderObjects {
    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn model_matrix_mut(&mut self, id: usize) -> Option<&mut Mat4> {
        self.objects.get_mut(id).map(|o| &mut o.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_returns_sequential_ids() {
        let mut objects = RenderObjects::new();
        assert_eq!(objects.spawn(RenderObject::new("a")), 0);
        assert_eq!(objects.spawn(RenderObject::new("b")), 1);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.find("b"), Some(1));
        assert_eq!(objects.find("c"), None);
    }

    #[test]
    fn test_remove_shifts_later_ids() {
        let mut objects = RenderObjects::new();
        objects.spawn(RenderObject::new("a"));
        objects.spawn(RenderObject::new("b"));
        objects.spawn(RenderObject::new("c"));

        let removed = objects.remove(0).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(objects.find("c"), Some(1));
        assert!(objects.get(2).is_none());
        assert!(objects.remove(5).is_none());
    }

    #[test]
    fn test_render_targets_view() {
        let mut objects = RenderObjects::new();
        objects.spawn(RenderObject::new("a"));

        assert_eq!(objects.object_count(), 1);
        objects.model_matrix_mut(0).unwrap()[3][0] = 4.0;
        assert_eq!(objects.get(0).unwrap().model[3][0], 4.0);
        assert!(objects.model_matrix_mut(1).is_none());
    }
}
