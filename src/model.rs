use anyhow::Context;
use glam::Vec3;
use gltf::buffer;
use id_arena::Id;

pub type ModelId = Id<Model>;

pub type Buffers<'a> = &'a [buffer::Data];

/// Local-space vertex positions of one mesh.
///
/// Only positions are kept; normals, UVs and indices play no part in
/// silhouette bounding boxes. A model with no vertices is representable and
/// is rejected by the projector rather than treated as a load error.
pub struct Model {
    pub name: String,
    pub positions: Vec<Vec3>,
}

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let name = name.into();
        let mut positions = Vec::new();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let position_reader = reader
                .read_positions()
                .with_context(|| format!("Primitive without positions in mesh: {}", name))?;

            positions.extend(position_reader.map(Vec3::from));
        }

        Ok(Model { name, positions })
    }
}
