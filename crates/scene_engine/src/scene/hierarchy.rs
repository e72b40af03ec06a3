//! Hierarchical transform propagation
//!
//! Parent/child links live inside each [`Transform`]; the transforms
//! themselves live in an arena addressed by [`EntityId`]. Every mutation
//! recomputes the derived state of the touched node and its whole subtree
//! immediately, walking the tree in pre-order so a parent is always final
//! before its children read it.

use crate::foundation::collections::{swap_remove_item, EntityId, SlotMap};
use crate::foundation::math::{Quat, Trs, Vec3};

use super::error::{SceneError, SceneResult};
use super::transform::Transform;

/// Arena that can hand out transforms by handle
pub trait TransformStore {
    /// Look up a transform
    fn transform(&self, id: EntityId) -> Option<&Transform>;

    /// Look up a transform mutably
    fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform>;
}

impl TransformStore for SlotMap<EntityId, Transform> {
    fn transform(&self, id: EntityId) -> Option<&Transform> {
        self.get(id)
    }

    fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.get_mut(id)
    }
}

/// Operations that keep a transform tree consistent
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformHierarchy {
    validate: bool,
}

impl TransformHierarchy {
    /// Create a hierarchy helper; `validate` enables NaN/Inf checks
    pub fn new(validate: bool) -> Self {
        Self { validate }
    }

    /// Whether derived transforms are checked for NaN/Inf
    pub fn validates(&self) -> bool {
        self.validate
    }

    /// Recompute the derived transform of `id` and every descendant
    ///
    /// Propagation always completes; if validation is on and a non-finite
    /// value shows up, the first offending node is reported.
    pub fn update_derived<S: TransformStore>(&self, store: &mut S, id: EntityId) -> SceneResult<()> {
        if store.transform(id).is_none() {
            return Err(SceneError::EntityNotFound(id));
        }

        let mut first_corrupt = None;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let parent_world = store
                .transform(current)
                .and_then(Transform::parent)
                .and_then(|parent| store.transform(parent))
                .map(|parent| *parent.derived());

            let Some(transform) = store.transform_mut(current) else {
                continue;
            };
            transform.derive(parent_world.as_ref());

            if self.validate && !transform.is_finite() {
                log::error!("Non-finite derived transform on {:?}: {:?}", current, transform.derived());
                first_corrupt.get_or_insert(current);
            }

            // Reverse so the first child is processed first
            stack.extend(transform.children.iter().rev().copied());
        }

        match first_corrupt {
            Some(corrupt) => Err(SceneError::NonFiniteTransform(corrupt)),
            None => Ok(()),
        }
    }

    /// Attach `child` under `parent`, or detach it with `None`
    ///
    /// Rejects self-parenting and any parent that is already a descendant of
    /// `child`. The child keeps its local transform, so its world transform
    /// follows the new parent.
    pub fn set_parent<S: TransformStore>(
        &self,
        store: &mut S,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> SceneResult<()> {
        let old_parent = store
            .transform(child)
            .ok_or(SceneError::EntityNotFound(child))?
            .parent;

        if let Some(new_parent) = parent {
            if new_parent == child {
                log::warn!("Refusing to parent {:?} to itself", child);
                return Err(SceneError::SelfParenting(child));
            }
            if store.transform(new_parent).is_none() {
                return Err(SceneError::EntityNotFound(new_parent));
            }
            if self.is_ancestor(store, child, new_parent) {
                log::warn!("Refusing to parent {:?} under its descendant {:?}", child, new_parent);
                return Err(SceneError::CyclicParenting { child, parent: new_parent });
            }
        }

        if old_parent != parent {
            if let Some(old) = old_parent.and_then(|old| store.transform_mut(old)) {
                swap_remove_item(&mut old.children, &child);
            }
            if let Some(new) = parent.and_then(|new| store.transform_mut(new)) {
                new.children.push(child);
            }
            if let Some(transform) = store.transform_mut(child) {
                transform.parent = parent;
            }
            log::trace!("Re-parented {:?}: {:?} -> {:?}", child, old_parent, parent);
        }

        self.update_derived(store, child)
    }

    /// Whether `ancestor` appears on the parent chain of `node` (or is `node`)
    pub fn is_ancestor<S: TransformStore>(&self, store: &S, ancestor: EntityId, node: EntityId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = store.transform(id).and_then(Transform::parent);
        }
        false
    }

    /// `id` followed by all of its descendants in pre-order
    pub fn subtree<S: TransformStore>(&self, store: &S, id: EntityId) -> Vec<EntityId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(transform) = store.transform(current) else {
                continue;
            };
            result.push(current);
            stack.extend(transform.children.iter().rev().copied());
        }
        result
    }

    /// Set the local position
    pub fn set_local_position<S: TransformStore>(&self, store: &mut S, id: EntityId, position: Vec3) -> SceneResult<()> {
        self.edit_local(store, id, |local| local.position = position)
    }

    /// Set the local rotation
    pub fn set_local_rotation<S: TransformStore>(&self, store: &mut S, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.edit_local(store, id, |local| local.rotation = rotation)
    }

    /// Set the local scale
    pub fn set_local_scale<S: TransformStore>(&self, store: &mut S, id: EntityId, scale: Vec3) -> SceneResult<()> {
        self.edit_local(store, id, |local| local.scale = scale)
    }

    /// Set the world position, back-solving the local one through the parent
    pub fn set_position<S: TransformStore>(&self, store: &mut S, id: EntityId, position: Vec3) -> SceneResult<()> {
        let local = self.solve_local(store, id, |world| world.position = position)?;
        self.set_local_position(store, id, local.position)
    }

    /// Set the world rotation, back-solving the local one through the parent
    pub fn set_rotation<S: TransformStore>(&self, store: &mut S, id: EntityId, rotation: Quat) -> SceneResult<()> {
        let local = self.solve_local(store, id, |world| world.rotation = rotation)?;
        self.set_local_rotation(store, id, local.rotation)
    }

    /// Set the world scale, back-solving the local one through the parent
    pub fn set_scale<S: TransformStore>(&self, store: &mut S, id: EntityId, scale: Vec3) -> SceneResult<()> {
        let local = self.solve_local(store, id, |world| world.scale = scale)?;
        self.set_local_scale(store, id, local.scale)
    }

    /// Set the whole world transform at once
    pub fn set_world<S: TransformStore>(&self, store: &mut S, id: EntityId, world: Trs) -> SceneResult<()> {
        let local = self.solve_local(store, id, |target| *target = world)?;
        self.edit_local(store, id, |current| *current = local)
    }

    /// Turn the node so its local `+Z` axis faces `target` in world space
    ///
    /// A target on top of the node leaves the rotation unchanged.
    pub fn look_at<S: TransformStore>(&self, store: &mut S, id: EntityId, target: Vec3, up: Vec3) -> SceneResult<()> {
        let position = store
            .transform(id)
            .ok_or(SceneError::EntityNotFound(id))?
            .position();
        let direction = target - position;
        if direction.magnitude_squared() <= f32::EPSILON {
            return Ok(());
        }
        self.set_rotation(store, id, Quat::face_towards(&direction, &up))
    }

    fn edit_local<S, F>(&self, store: &mut S, id: EntityId, edit: F) -> SceneResult<()>
    where
        S: TransformStore,
        F: FnOnce(&mut Trs),
    {
        let transform = store.transform_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        edit(transform.local_mut());
        self.update_derived(store, id)
    }

    /// Local transform that would produce the current world transform with
    /// `edit` applied
    fn solve_local<S, F>(&self, store: &S, id: EntityId, edit: F) -> SceneResult<Trs>
    where
        S: TransformStore,
        F: FnOnce(&mut Trs),
    {
        let transform = store.transform(id).ok_or(SceneError::EntityNotFound(id))?;
        let mut world = *transform.derived();
        edit(&mut world);

        let parent_world = transform
            .parent()
            .and_then(|parent| store.transform(parent))
            .map(|parent| *parent.derived());

        match parent_world {
            Some(parent) => parent
                .solve_local(&world)
                .ok_or(SceneError::DegenerateParentScale(id)),
            None => Ok(world),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store() -> SlotMap<EntityId, Transform> {
        SlotMap::with_key()
    }

    #[test]
    fn test_child_follows_parent_translation() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let parent = transforms.insert(Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let child = transforms.insert(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));

        hierarchy.set_parent(&mut transforms, child, Some(parent)).unwrap();
        assert_relative_eq!(transforms[child].position(), Vec3::new(10.0, 1.0, 0.0));

        hierarchy.set_local_position(&mut transforms, parent, Vec3::new(-5.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(transforms[child].position(), Vec3::new(-5.0, 1.0, 0.0));
    }

    #[test]
    fn test_self_parenting_rejected() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let node = transforms.insert(Transform::new());

        let err = hierarchy.set_parent(&mut transforms, node, Some(node)).unwrap_err();
        assert_eq!(err, SceneError::SelfParenting(node));
        assert_eq!(transforms[node].parent(), None);
    }

    #[test]
    fn test_cycle_through_grandchild_rejected() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let a = transforms.insert(Transform::new());
        let b = transforms.insert(Transform::new());
        let c = transforms.insert(Transform::new());

        hierarchy.set_parent(&mut transforms, b, Some(a)).unwrap();
        hierarchy.set_parent(&mut transforms, c, Some(b)).unwrap();

        let err = hierarchy.set_parent(&mut transforms, a, Some(c)).unwrap_err();
        assert_eq!(err, SceneError::CyclicParenting { child: a, parent: c });
        assert_eq!(transforms[a].parent(), None);
    }

    #[test]
    fn test_reparent_moves_between_child_lists() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let first = transforms.insert(Transform::new());
        let second = transforms.insert(Transform::new());
        let kids: Vec<_> = (0..3).map(|_| transforms.insert(Transform::new())).collect();

        for kid in &kids {
            hierarchy.set_parent(&mut transforms, *kid, Some(first)).unwrap();
        }
        hierarchy.set_parent(&mut transforms, kids[0], Some(second)).unwrap();

        // Swap-remove: the last sibling fills the hole
        assert_eq!(transforms[first].children(), &[kids[2], kids[1]]);
        assert_eq!(transforms[second].children(), &[kids[0]]);

        hierarchy.set_parent(&mut transforms, kids[0], None).unwrap();
        assert!(transforms[second].children().is_empty());
        assert_eq!(transforms[kids[0]].parent(), None);
    }

    #[test]
    fn test_world_setters_back_solve_through_parent() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let parent = transforms.insert(
            Transform::from_position(Vec3::new(3.0, 0.0, 0.0))
                .with_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 1.1))
                .with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        let child = transforms.insert(Transform::new());
        hierarchy.set_parent(&mut transforms, child, Some(parent)).unwrap();

        let target_rotation = Quat::from_axis_angle(&Vec3::x_axis(), 0.25);
        hierarchy.set_position(&mut transforms, child, Vec3::new(-1.0, 4.0, 2.0)).unwrap();
        hierarchy.set_rotation(&mut transforms, child, target_rotation).unwrap();
        hierarchy.set_scale(&mut transforms, child, Vec3::new(1.0, 1.0, 1.0)).unwrap();

        assert_relative_eq!(transforms[child].position(), Vec3::new(-1.0, 4.0, 2.0), epsilon = 1e-4);
        assert!(transforms[child].rotation().angle_to(&target_rotation) < 1e-4);
        assert_relative_eq!(transforms[child].scale(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(transforms[child].local_scale(), Vec3::new(0.5, 0.5, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_parent_scale_cannot_back_solve() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let parent = transforms.insert(Transform::new().with_scale(Vec3::new(0.0, 1.0, 1.0)));
        let child = transforms.insert(Transform::new());
        hierarchy.set_parent(&mut transforms, child, Some(parent)).unwrap();

        let err = hierarchy.set_position(&mut transforms, child, Vec3::new(1.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, SceneError::DegenerateParentScale(child));
    }

    #[test]
    fn test_nan_detected_when_validating() {
        let mut transforms = store();
        let parent = transforms.insert(Transform::new());
        let child = transforms.insert(Transform::new());
        TransformHierarchy::new(true).set_parent(&mut transforms, child, Some(parent)).unwrap();

        let err = TransformHierarchy::new(true)
            .set_local_position(&mut transforms, parent, Vec3::new(f32::NAN, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, SceneError::NonFiniteTransform(parent));

        // Validation off: the corruption goes unreported
        assert!(TransformHierarchy::new(false)
            .set_local_position(&mut transforms, child, Vec3::new(0.0, 1.0, 0.0))
            .is_ok());
    }

    #[test]
    fn test_subtree_is_preorder() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(false);
        let root = transforms.insert(Transform::new());
        let a = transforms.insert(Transform::new());
        let b = transforms.insert(Transform::new());
        let a1 = transforms.insert(Transform::new());
        hierarchy.set_parent(&mut transforms, a, Some(root)).unwrap();
        hierarchy.set_parent(&mut transforms, b, Some(root)).unwrap();
        hierarchy.set_parent(&mut transforms, a1, Some(a)).unwrap();

        assert_eq!(hierarchy.subtree(&transforms, root), vec![root, a, a1, b]);
    }

    #[test]
    fn test_look_at_points_forward_axis() {
        let mut transforms = store();
        let hierarchy = TransformHierarchy::new(true);
        let eye = transforms.insert(Transform::from_position(Vec3::new(0.0, 0.0, -10.0)));

        hierarchy.look_at(&mut transforms, eye, Vec3::new(10.0, 0.0, -10.0), Vec3::y()).unwrap();

        let forward = transforms[eye].rotation() * Vec3::z();
        assert_relative_eq!(forward, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }
}
