use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::camera::{Camera, Lens, DEFAULT_ASPECT};
use crate::model::{Buffers, Model, ModelId};
use crate::scene_graph::animation::{AnimationClip, Channel, Interpolation, Keyframes};
use crate::scene_graph::object3d::{Object3D, ObjectId};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<Model>,
    pub animations: Vec<AnimationClip>,
    /// Frames per second used to convert frame indices to animation time.
    pub fps: f32,
    groups: HashMap<String, HashSet<ObjectId>>,
    active_camera_id: Option<ObjectId>,
    current_frame: u32,
    gltf_mesh_to_model: HashMap<usize, ModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            animations: Vec::new(),
            fps: 24.0,
            groups: HashMap::new(),
            active_camera_id: None,
            current_frame: 0,
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    /// Loads a glTF file into a scene: node hierarchy, mesh positions, the
    /// first camera, animations, and per-node `class_id`/`groups` extras.
    pub fn from_gltf(path: impl AsRef<Path>) -> Result<Scene> {
        let path = path.as_ref();
        let (document, buffers, _images) = gltf::import(path)
            .with_context(|| format!("Failed to import glTF file: {}", path.display()))?;

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .with_context(|| format!("No scenes in glTF file: {}", path.display()))?;

        let mut scene = Scene::new();
        let mut node_to_object = HashMap::new();

        for node in gltf_scene.nodes() {
            scene.spawn_gltf_node(&buffers, &node, None, &mut node_to_object)?;
        }

        scene.load_animations(&document, &buffers, &node_to_object);
        scene.update_transforms();

        Ok(scene)
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.alloc(model)
    }

    pub fn add_to_group(&mut self, group: &str, id: ObjectId) {
        self.groups.entry(group.to_string()).or_default().insert(id);
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn group_contains(&self, group: &str, id: ObjectId) -> bool {
        self.groups
            .get(group)
            .map(|members| members.contains(&id))
            .unwrap_or(false)
    }

    pub fn set_active_camera(&mut self, id: ObjectId) {
        self.active_camera_id = Some(id);
    }

    /// Resolves the active camera's pose for the current frame. `None` when
    /// the scene has no camera node.
    pub fn active_camera(&self) -> Option<Camera> {
        let id = self.active_camera_id?;
        let object = self.objects.get(id)?;
        let lens = object.lens?;

        Some(Camera {
            world: *object.transform.get_world_matrix(),
            lens,
        })
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Advances the scene to `frame`: samples every animation channel at
    /// `frame / fps` seconds and refreshes world matrices.
    pub fn set_current_frame(&mut self, frame: u32) {
        self.current_frame = frame;
        let time = frame as f32 / self.fps;

        let mut animated = Vec::new();
        for clip in &self.animations {
            for channel in &clip.channels {
                if let Some(object) = self.objects.get_mut(channel.target) {
                    channel.apply(time, &mut object.transform);
                    animated.push(channel.target);
                }
            }
        }

        for id in animated {
            self.invalidate_object_hierarchy(id);
        }

        self.update_transforms();
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        node_to_object: &mut HashMap<usize, ObjectId>,
    ) -> Result<ObjectId> {
        let mut object = Object3D::default();
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        object.name = node_name.clone();

        let (translation, rotation, scale) = node.transform().decomposed();
        object.transform.set_transform(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );

        let mut group_names = Vec::new();
        if let Some(extras) = node.extras() {
            self.read_node_extras(extras.get(), &node_name, &mut object, &mut group_names);
        }

        if let Some(camera) = node.camera() {
            match camera.projection() {
                gltf::camera::Projection::Perspective(perspective) => {
                    object.lens = Some(Lens {
                        yfov: perspective.yfov(),
                        aspect: perspective.aspect_ratio().unwrap_or(DEFAULT_ASPECT),
                        znear: perspective.znear(),
                        zfar: perspective.zfar(),
                    });
                }
                gltf::camera::Projection::Orthographic(_) => {
                    log::debug!("Skipping orthographic camera on node {:?}", node_name);
                }
            }
        }

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name, mesh, buffers)?;
                    let model_id = self.add_model(model);
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            object.model_id = Some(model_id);
        }

        let has_lens = object.lens.is_some();
        let object_id = self.add_object(object);
        node_to_object.insert(node.index(), object_id);

        for group in group_names {
            self.add_to_group(&group, object_id);
        }

        if has_lens && self.active_camera_id.is_none() {
            self.active_camera_id = Some(object_id);
        }

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id), node_to_object)?;
        }

        Ok(object_id)
    }

    /// Node extras carry the labeling metadata: `class_id` (integer) and
    /// `groups` (array of strings). Content tools that support per-object
    /// custom properties export them through this channel.
    fn read_node_extras(
        &self,
        extras: &str,
        node_name: &str,
        object: &mut Object3D,
        group_names: &mut Vec<String>,
    ) {
        let value: serde_json::Value = match serde_json::from_str(extras) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("Ignoring malformed extras on node {:?}: {}", node_name, err);
                return;
            }
        };

        object.class_id = value
            .get("class_id")
            .and_then(serde_json::Value::as_u64)
            .map(|class_id| class_id as u32);

        if let Some(groups) = value.get("groups").and_then(serde_json::Value::as_array) {
            group_names.extend(
                groups
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(String::from),
            );
        }
    }

    fn load_animations(
        &mut self,
        document: &gltf::Document,
        buffers: Buffers,
        node_to_object: &HashMap<usize, ObjectId>,
    ) {
        for animation in document.animations() {
            let mut channels = Vec::new();

            for channel in animation.channels() {
                let Some(&target) = node_to_object.get(&channel.target().node().index()) else {
                    continue;
                };

                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(inputs) = reader.read_inputs() else {
                    continue;
                };
                let times: Vec<f32> = inputs.collect();

                let cubic =
                    channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline;
                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Step => Interpolation::Step,
                    _ => Interpolation::Linear,
                };

                let keyframes = match reader.read_outputs() {
                    Some(gltf::animation::util::ReadOutputs::Translations(values)) => {
                        Keyframes::Translation(spline_values(values.map(Vec3::from), cubic))
                    }
                    Some(gltf::animation::util::ReadOutputs::Rotations(values)) => {
                        Keyframes::Rotation(spline_values(
                            values.into_f32().map(Quat::from_array),
                            cubic,
                        ))
                    }
                    Some(gltf::animation::util::ReadOutputs::Scales(values)) => {
                        Keyframes::Scale(spline_values(values.map(Vec3::from), cubic))
                    }
                    _ => continue,
                };

                let key_count = match &keyframes {
                    Keyframes::Translation(keys) | Keyframes::Scale(keys) => keys.len(),
                    Keyframes::Rotation(keys) => keys.len(),
                };

                if times.is_empty()
                    || times.len() != key_count
                    || times.windows(2).any(|pair| pair[0] >= pair[1])
                {
                    log::debug!(
                        "Skipping malformed animation channel in {:?}",
                        animation.name().unwrap_or("Unnamed")
                    );
                    continue;
                }

                channels.push(Channel {
                    target,
                    times,
                    keyframes,
                    interpolation,
                });
            }

            if !channels.is_empty() {
                self.animations.push(AnimationClip {
                    name: animation.name().unwrap_or("Unnamed").to_string(),
                    channels,
                });
            }
        }
    }

    /// Updates all object transforms in hierarchical order.
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants.
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships.
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Cubic-spline samplers store in-tangent, value, out-tangent per keyframe;
/// we sample at the value and interpolate linearly.
fn spline_values<T>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.skip(1).step_by(3).collect()
    } else {
        values.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_object(name: &str) -> Object3D {
        Object3D {
            name: name.to_string(),
            ..Object3D::default()
        }
    }

    #[test]
    fn child_world_matrix_includes_parent_translation() {
        let mut scene = Scene::new();
        let parent = scene.add_object(mesh_object("parent"));
        let child = scene.add_object(mesh_object("child"));
        scene.set_object_parent(child, Some(parent));

        scene.set_object_transform(parent, Vec3::new(0.0, 3.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        scene.set_object_transform(child, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        scene.update_transforms();

        let world = *scene.objects[child].transform.get_world_matrix();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 3.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn group_membership_is_per_group() {
        let mut scene = Scene::new();
        let a = scene.add_object(mesh_object("a"));
        let b = scene.add_object(mesh_object("b"));

        scene.add_to_group("train", a);

        assert!(scene.has_group("train"));
        assert!(!scene.has_group("val"));
        assert!(scene.group_contains("train", a));
        assert!(!scene.group_contains("train", b));
    }

    #[test]
    fn set_current_frame_applies_animation_to_world_matrices() {
        let mut scene = Scene::new();
        scene.fps = 1.0;
        let target = scene.add_object(mesh_object("mover"));

        scene.animations.push(AnimationClip {
            name: "slide".to_string(),
            channels: vec![Channel {
                target,
                times: vec![0.0, 2.0],
                keyframes: Keyframes::Translation(vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)]),
                interpolation: Interpolation::Linear,
            }],
        });

        scene.set_current_frame(1);
        let world = *scene.objects[target].transform.get_world_matrix();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(scene.current_frame(), 1);
    }
}
