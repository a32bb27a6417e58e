//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] is an arena owned by exactly one mounted view. Nodes refer to each
//! other by [`NodeId`] and never leave the arena, so dropping the scene (or calling
//! [`Scene::clear`]) discards every node at once. Geometry lives in a side table:
//! it is immutable once added and may be drawn by several nodes of the same scene.

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Transform};
use log::warn;

use crate::data_structures::{
    geometry::Geometry,
    instance::Instance,
    material::{Color, Material},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(usize);

impl GeometryId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Which pass a node contributes to when selective bloom is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    #[default]
    Base,
    Glow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from the node's position towards the origin.
    Directional,
    /// `range` of 0 means no falloff cutoff.
    Point { range: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
        }
    }

    pub fn point(color: Color, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point { range },
            color,
            intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Transform-only node used to move its children together.
    Group,
    Mesh {
        geometry: GeometryId,
        material: Material,
    },
    Points {
        geometry: GeometryId,
        material: Material,
    },
    Light(Light),
}

impl From<Light> for NodeKind {
    fn from(light: Light) -> Self {
        NodeKind::Light(light)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Instance,
    pub layer: Layer,
    world: Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn world(&self) -> &Matrix4<f32> {
        &self.world
    }

    pub fn world_position(&self) -> Point3<f32> {
        self.world.transform_point(Point3::origin())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } | NodeKind::Points { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } | NodeKind::Points { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Option<GeometryId> {
        match &self.kind {
            NodeKind::Mesh { geometry, .. } | NodeKind::Points { geometry, .. } => Some(*geometry),
            _ => None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        self.geometry().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    geometries: Vec<Geometry>,
    live: usize,
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            geometries: Vec::new(),
            live: 0,
            background: [0.0; 3],
        }
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries
            .iter()
            .enumerate()
            .map(|(i, geometry)| (GeometryId(i), geometry))
    }

    /// Adds a top-level node.
    pub fn add(&mut self, name: impl Into<String>, kind: NodeKind, local: Instance) -> NodeId {
        let id = self.insert(name.into(), kind, local, None);
        self.roots.push(id);
        id
    }

    /// Adds a node below `parent`. A stale parent id attaches the node at the top level.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        local: Instance,
    ) -> NodeId {
        let name = name.into();
        if self.get(parent).is_none() {
            warn!(
                "parent {:?} of node '{}' is not part of the scene, adding it as a root",
                parent, name
            );
            return self.add(name, kind, local);
        }
        let id = self.insert(name, kind, local, Some(parent));
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    fn insert(&mut self, name: String, kind: NodeKind, local: Instance, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Some(Node {
            name,
            kind,
            local,
            layer: Layer::Base,
            world: Matrix4::identity(),
            parent,
            children: Vec::new(),
        }));
        self.live += 1;
        NodeId(self.nodes.len() - 1)
    }

    pub fn set_layer(&mut self, id: NodeId, layer: Layer) {
        if let Some(node) = self.get_mut(id) {
            node.layer = layer;
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Removes `id` together with its descendants and returns how many nodes went away.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };
        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        self.live -= 1;
        let mut removed = 1;
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(child) = self.nodes.get_mut(child.0).and_then(Option::take) {
                stack.extend(child.children);
                self.live -= 1;
                removed += 1;
            }
        }
        removed
    }

    /// Drops every node and geometry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.geometries.clear();
        self.live = 0;
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|node| (NodeId(i), node)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .filter_map(|(i, node)| node.as_mut().map(|node| (NodeId(i), node)))
    }

    /// Meshes and point clouds, in insertion order.
    pub fn renderables(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.iter().filter(|(_, node)| node.is_renderable())
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeId, &Node, &Light)> {
        self.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::Light(light) => Some((id, node, light)),
            _ => None,
        })
    }

    /// Recomputes every world matrix from the local transforms, parents first.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .roots
            .iter()
            .rev()
            .map(|root| (*root, Matrix4::identity()))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            node.world = parent_world * node.local.to_matrix();
            let world = node.world;
            stack.extend(node.children.iter().rev().map(|child| (*child, world)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::geometry;

    fn cube_scene() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(geometry::cuboid(1.0, 1.0, 1.0));
        let group = scene.add("group", NodeKind::Group, Instance::at((0.0, 1.0, 0.0)));
        let mesh = scene.add_child(
            group,
            "cube",
            NodeKind::Mesh {
                geometry: cube,
                material: Material::basic([1.0; 3]),
            },
            Instance::at((2.0, 0.0, 0.0)),
        );
        (scene, group, mesh)
    }

    #[test]
    fn children_inherit_parent_transform() {
        let (mut scene, _, mesh) = cube_scene();
        scene.update_world_transforms();
        let position = scene.get(mesh).unwrap().world_position();
        assert_eq!(position, Point3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn removing_a_group_removes_its_subtree() {
        let (mut scene, group, mesh) = cube_scene();
        scene.add("light", Light::ambient([1.0; 3], 0.5).into(), Instance::new());
        assert_eq!(scene.len(), 3);

        assert_eq!(scene.remove(group), 2);
        assert!(scene.get(mesh).is_none());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.remove(group), 0);
    }

    #[test]
    fn clear_discards_everything() {
        let (mut scene, _, _) = cube_scene();
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.geometries().count(), 0);
        assert_eq!(scene.renderables().count(), 0);
    }

    #[test]
    fn stale_parent_becomes_root() {
        let (mut scene, group, _) = cube_scene();
        scene.remove(group);
        let orphan = scene.add_child(group, "orphan", NodeKind::Group, Instance::new());
        assert_eq!(scene.get(orphan).unwrap().parent(), None);
    }
}
