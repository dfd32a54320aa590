use id_arena::Id;

use crate::camera::Lens;
use crate::model::ModelId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// A node in the scene graph.
///
/// `class_id` is the detection category attached by the scene author; objects
/// without one are never labeled. A node carrying a `lens` can act as the
/// active camera.
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<ModelId>,
    pub class_id: Option<u32>,
    pub lens: Option<Lens>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn is_mesh(&self) -> bool {
        self.model_id.is_some()
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            model_id: None,
            class_id: None,
            lens: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
