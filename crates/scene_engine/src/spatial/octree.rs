//! Octree spatial partitioning structure
//!
//! A fully pre-built octree: every node down to `max_depth` is
//! allocated at construction in one flat array and never created or
//! destroyed afterwards. Entities are attached to the smallest node that
//! fully contains their world AABB. An entity straddling a split plane stays
//! at the level where the split happens; one that does not fit the root at
//! all is attached to the root.

use crate::bounds::{Aabb, BoundingSphere, Containment, Frustum};
use crate::foundation::collections::{swap_remove_item, EntityId, SecondaryMap};
use crate::foundation::math::Vec3;

/// Index of the root node
pub const ROOT: usize = 0;

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctNode {
    /// World-space bounds of this node
    pub bounds: Aabb,
    /// Parent node index, `None` for the root
    pub parent: Option<usize>,
    /// Child node indices by octant, `None` at the deepest level
    ///
    /// Octant bits: bit 0 = +X, bit 1 = +Y, bit 2 = +Z.
    pub children: Option<[usize; 8]>,
    /// Depth in the tree (0 = root)
    pub depth: u32,
    attached: Vec<EntityId>,
}

impl OctNode {
    fn new(bounds: Aabb, parent: Option<usize>, depth: u32) -> Self {
        Self {
            bounds,
            parent,
            children: None,
            depth,
            attached: Vec::new(),
        }
    }

    /// Entities attached directly to this node (order is not meaningful)
    pub fn attached(&self) -> &[EntityId] {
        &self.attached
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Where an entity currently lives and the volumes it was placed with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeEntry {
    /// Node the entity is attached to
    pub octant: usize,
    /// World AABB used for placement
    pub aabb: Aabb,
    /// World bounding sphere used for queries
    pub sphere: BoundingSphere,
}

/// Result of testing a volume against the eight children of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildFit {
    /// No child fully contains the volume (or the node has no children)
    None,
    /// Exactly one child fully contains it
    Single(usize),
    /// Several children contain it (it sits on a split plane); the volume
    /// stays with the parent
    ParentOnAmbiguousFit,
}

/// Why placement stopped at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementReason {
    /// The node is at the maximum depth
    MaxDepth,
    /// No child fully contains the volume
    Straddles,
    /// More than one child contains the volume
    AmbiguousFit,
    /// The volume does not fit the node it started from (only the root)
    OutsideBounds,
}

/// Outcome of placing an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Node the entity is attached to
    pub octant: usize,
    /// Depth of that node
    pub depth: u32,
    /// Why the descent stopped there
    pub reason: PlacementReason,
}

/// Octree spatial index over entity bounding volumes
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctNode>,
    max_depth: u32,
    entries: SecondaryMap<EntityId, OctreeEntry>,
}

impl Octree {
    /// Build the full tree over `bounds` down to `max_depth`
    pub fn new(bounds: Aabb, max_depth: u32) -> Self {
        let capacity: usize = (0..=max_depth).map(|d| 8_usize.pow(d)).sum();
        let mut tree = Self {
            nodes: Vec::with_capacity(capacity),
            max_depth,
            entries: SecondaryMap::new(),
        };
        tree.nodes.push(OctNode::new(bounds, None, 0));
        tree.create_children(ROOT);

        log::debug!(
            "Built octree: depth {}, {} nodes, bounds {:?}..{:?}",
            max_depth,
            tree.nodes.len(),
            bounds.min,
            bounds.max
        );
        tree
    }

    /// Recursively subdivide `node` until the maximum depth
    fn create_children(&mut self, node: usize) {
        let parent = &self.nodes[node];
        if parent.depth >= self.max_depth {
            return;
        }

        let center = parent.bounds.center();
        let quarter_extents = parent.bounds.extents() * 0.5;
        let depth = parent.depth + 1;

        let mut children = [0; 8];
        for (octant, child) in children.iter_mut().enumerate() {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = center
                + Vec3::new(
                    quarter_extents.x * sign(1),
                    quarter_extents.y * sign(2),
                    quarter_extents.z * sign(4),
                );

            *child = self.nodes.len();
            self.nodes.push(OctNode::new(
                Aabb::from_center_extents(child_center, quarter_extents),
                Some(node),
                depth,
            ));
        }
        self.nodes[node].children = Some(children);

        for child in children {
            self.create_children(child);
        }
    }

    /// Add (or re-add) an entity, placing it from the root
    pub fn insert(&mut self, entity: EntityId, sphere: &BoundingSphere) -> Placement {
        let aabb = Aabb::from_sphere(sphere);
        let placement = self.place_scene_node(entity, &aabb, ROOT);
        self.entries.insert(entity, OctreeEntry { octant: placement.octant, aabb, sphere: *sphere });
        placement
    }

    /// Remove an entity; returns false if it was not tracked
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(entry) = self.entries.remove(entity) else {
            return false;
        };
        swap_remove_item(&mut self.nodes[entry.octant].attached, &entity);
        true
    }

    /// Re-home an entity after its world volume changed
    ///
    /// The descent starts at the current node when that node still contains
    /// the new AABB, otherwise at the root. Returns `None` for an entity the
    /// tree does not track.
    pub fn verify_aabb(&mut self, entity: EntityId, sphere: &BoundingSphere) -> Option<Placement> {
        let current = self.entries.get(entity)?.octant;
        let aabb = Aabb::from_sphere(sphere);
        let start = if self.nodes[current].bounds.contains_aabb(&aabb) { current } else { ROOT };

        let placement = self.place_scene_node(entity, &aabb, start);
        self.entries.insert(entity, OctreeEntry { octant: placement.octant, aabb, sphere: *sphere });
        if placement.octant != current {
            log::trace!("{:?} moved from octant {} to {}", entity, current, placement.octant);
        }
        Some(placement)
    }

    /// Descend from `start` and attach the entity where the descent stops
    fn place_scene_node(&mut self, entity: EntityId, aabb: &Aabb, start: usize) -> Placement {
        let mut current = start;
        let reason = loop {
            let node = &self.nodes[current];
            if node.depth >= self.max_depth {
                break PlacementReason::MaxDepth;
            }
            if !node.bounds.contains_aabb(aabb) {
                break PlacementReason::OutsideBounds;
            }
            match self.classify_children(current, aabb) {
                ChildFit::None => break PlacementReason::Straddles,
                ChildFit::Single(child) => current = child,
                ChildFit::ParentOnAmbiguousFit => break PlacementReason::AmbiguousFit,
            }
        };

        self.attach(entity, current);
        let placement = Placement {
            octant: current,
            depth: self.nodes[current].depth,
            reason,
        };
        log::trace!("Placed {:?}: {:?}", entity, placement);
        placement
    }

    /// Which of a node's children fully contain `aabb`
    pub fn classify_children(&self, node: usize, aabb: &Aabb) -> ChildFit {
        let Some(children) = self.nodes[node].children else {
            return ChildFit::None;
        };

        let mut fit = ChildFit::None;
        for child in children {
            if self.nodes[child].bounds.contains_aabb(aabb) {
                if fit != ChildFit::None {
                    return ChildFit::ParentOnAmbiguousFit;
                }
                fit = ChildFit::Single(child);
            }
        }
        fit
    }

    fn attach(&mut self, entity: EntityId, octant: usize) {
        if let Some(previous) = self.entries.get(entity).map(|e| e.octant) {
            swap_remove_item(&mut self.nodes[previous].attached, &entity);
        }
        self.nodes[octant].attached.push(entity);
    }

    /// Collect entities whose sphere is not outside `frustum`
    ///
    /// Subtrees whose bounds lie fully inside the frustum are accepted
    /// without testing their entities. Root entities may not fit the root
    /// and are always tested individually.
    pub fn query_frustum(&self, frustum: &Frustum, out: &mut Vec<EntityId>) {
        let root = &self.nodes[ROOT];
        self.collect_tested(root, out, |sphere| frustum.intersect_sphere(sphere).is_visible());

        let mut stack: Vec<usize> = root.children.map(|c| c.to_vec()).unwrap_or_default();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match frustum.intersect_aabb(&node.bounds) {
                Containment::Outside => {}
                Containment::Inside => self.collect_subtree(index, out),
                Containment::Intersecting => {
                    self.collect_tested(node, out, |sphere| frustum.intersect_sphere(sphere).is_visible());
                    if let Some(children) = node.children {
                        stack.extend(children);
                    }
                }
            }
        }
    }

    /// Entities whose sphere touches the query sphere
    pub fn query_sphere(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let query = BoundingSphere::new(center, radius);
        let mut results = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if index != ROOT && node.bounds.distance_squared_to_point(center) > radius * radius {
                continue;
            }
            self.collect_tested(node, &mut results, |sphere| sphere.intersects(&query));
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        results
    }

    /// Entities whose AABB overlaps `aabb`
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<EntityId> {
        let mut results = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if index != ROOT && !node.bounds.intersects(aabb) {
                continue;
            }
            for entity in &node.attached {
                if self.entries.get(*entity).is_some_and(|e| e.aabb.intersects(aabb)) {
                    results.push(*entity);
                }
            }
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        results
    }

    fn collect_tested<F>(&self, node: &OctNode, out: &mut Vec<EntityId>, test: F)
    where
        F: Fn(&BoundingSphere) -> bool,
    {
        for entity in &node.attached {
            if self.entries.get(*entity).is_some_and(|e| test(&e.sphere)) {
                out.push(*entity);
            }
        }
    }

    fn collect_subtree(&self, index: usize, out: &mut Vec<EntityId>) {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            out.extend_from_slice(&node.attached);
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    /// Node an entity is attached to
    pub fn octant_of(&self, entity: EntityId) -> Option<usize> {
        self.entries.get(entity).map(|e| e.octant)
    }

    /// Placement record of an entity
    pub fn entry(&self, entity: EntityId) -> Option<&OctreeEntry> {
        self.entries.get(entity)
    }

    /// Whether the tree tracks an entity
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(entity)
    }

    /// Node by index
    pub fn octant(&self, index: usize) -> Option<&OctNode> {
        self.nodes.get(index)
    }

    /// Indices of all nodes at a depth (for visualization)
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.depth == depth)
            .map(|(index, _)| index)
            .collect()
    }

    /// Indices of nodes with at least one attached entity
    pub fn occupied_octants(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.attached.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of tracked entities
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum depth
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Root bounds
    pub fn bounds(&self) -> &Aabb {
        &self.nodes[ROOT].bounds
    }

    /// Detach every entity, keeping the node structure
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.attached.clear();
        }
        self.entries.clear();
    }
}
