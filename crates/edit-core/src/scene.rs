//! Editor scene: entity storage, hierarchy, world transforms and selection

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::{Entity, Transform};
use crate::geometry::BoundingBox;

/// Scene-related errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SceneError {
    #[error("Entity not found: {0}")]
    EntityNotFound(Uuid),

    #[error("Entity already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("Parenting {child} under {parent} would create a cycle")]
    WouldCreateCycle { child: Uuid, parent: Uuid },

    #[error("No finite local transform for {0}")]
    DegenerateTransform(Uuid),
}

/// Smallest magnitude a local scale component may shrink to
pub const MIN_SCALE: f32 = 1e-4;

/// Parent matrices with a smaller determinant are treated as non-invertible
const SINGULAR_DETERMINANT: f32 = 1e-15;

/// A subtree taken out of the scene, ready to be put back as it was
#[derive(Debug, Clone)]
pub struct DetachedSubtree {
    /// Entities in parent-then-child order; the first one is the subtree root
    pub entities: Vec<Entity>,
    /// Parent of the subtree root at the time of removal
    pub parent: Option<Uuid>,
    /// Position of the root among its parent's children
    pub sibling_index: usize,
}

impl DetachedSubtree {
    pub fn root_id(&self) -> Option<Uuid> {
        self.entities.first().map(|e| e.id)
    }
}

/// Entity container with parent/child links and a selection list.
///
/// The last selected entity is the *current* selection, which transform
/// handles pivot around.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    entities: HashMap<Uuid, Entity>,
    /// Insertion order, used for deterministic iteration
    order: Vec<Uuid>,
    selection: Vec<Uuid>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. If its `parent` exists the entity is appended to the
    /// parent's children, otherwise it becomes a root.
    pub fn add_entity(&mut self, mut entity: Entity) -> Uuid {
        let id = entity.id;
        if self.entities.contains_key(&id) {
            tracing::warn!("Entity {} already in scene, replacing", id);
            self.remove_entity_record(id);
        }

        match entity.parent {
            Some(parent_id) if self.entities.contains_key(&parent_id) => {
                if let Some(parent) = self.entities.get_mut(&parent_id)
                    && !parent.children.contains(&id)
                {
                    parent.children.push(id);
                }
            }
            _ => entity.parent = None,
        }

        // Children are linked when they are added themselves.
        entity.children.retain(|c| self.entities.contains_key(c));
        for child in entity.children.clone() {
            if let Some(child) = self.entities.get_mut(&child) {
                child.parent = Some(id);
            }
        }

        self.order.push(id);
        self.entities.insert(id, entity);
        id
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Ids of every entity matching the predicate, in insertion order
    pub fn filter(&self, predicate: impl Fn(&Entity) -> bool) -> Vec<Uuid> {
        self.iter().filter(|e| predicate(e)).map(|e| e.id).collect()
    }

    /// Drop every entity and the selection
    pub fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
        self.selection.clear();
    }

    // Hierarchy
    //////////////////////////////////////////

    pub fn parent(&self, id: Uuid) -> Option<Uuid> {
        self.entities.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.entities
            .get(&id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    /// All descendants of `id` in parent-then-child order, excluding `id`
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: Uuid, out: &mut Vec<Uuid>) {
        for child in self.children(id) {
            out.push(*child);
            self.collect_descendants(*child, out);
        }
    }

    /// True if `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: Uuid, id: Uuid) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Entities of `ids` that have no ancestor inside `ids`, order preserved
    pub fn root_entities(&self, ids: &[Uuid]) -> Vec<Uuid> {
        ids.iter()
            .copied()
            .filter(|id| self.contains(*id))
            .filter(|id| !ids.iter().any(|other| other != id && self.is_ancestor(*other, *id)))
            .collect()
    }

    /// Topmost prefab containing `id`, if any
    pub fn prefab_root(&self, id: Uuid) -> Option<Uuid> {
        let mut found = None;
        let mut current = self.parent(id);
        while let Some(p) = current {
            if self.get(p).is_some_and(|e| e.kind.is_prefab()) {
                found = Some(p);
            }
            current = self.parent(p);
        }
        found
    }

    /// Reparent `child`. With `preserve_world` the child keeps its world
    /// transform, otherwise its local transform is kept as is.
    pub fn set_parent(
        &mut self,
        child: Uuid,
        parent: Option<Uuid>,
        preserve_world: bool,
    ) -> Result<(), SceneError> {
        self.set_parent_at(child, parent, None, preserve_world)
    }

    /// Position of `id` among its parent's children
    pub fn sibling_index(&self, id: Uuid) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Reparent `child`, inserting it at `index` among the new siblings
    /// (appended when `None` or out of range).
    pub fn set_parent_at(
        &mut self,
        child: Uuid,
        parent: Option<Uuid>,
        index: Option<usize>,
        preserve_world: bool,
    ) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            if parent == child || self.is_ancestor(child, parent) {
                return Err(SceneError::WouldCreateCycle { child, parent });
            }
        }

        let world = self.world_matrix(child);

        if let Some(old_parent) = self.parent(child)
            && let Some(old) = self.entities.get_mut(&old_parent)
        {
            old.children.retain(|c| *c != child);
        }

        if let Some(parent) = parent
            && let Some(new_parent) = self.entities.get_mut(&parent)
        {
            match index {
                Some(i) if i <= new_parent.children.len() => new_parent.children.insert(i, child),
                _ => new_parent.children.push(child),
            }
        }

        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = parent;
        }

        if preserve_world && let Some(world) = world {
            self.set_world_matrix(child, world)?;
        }

        Ok(())
    }

    // Transforms
    //////////////////////////////////////////

    /// World matrix, composed from the root down to `id`
    pub fn world_matrix(&self, id: Uuid) -> Option<Mat4> {
        let entity = self.entities.get(&id)?;
        let local = entity.local.to_mat4();
        match entity.parent {
            Some(parent) => Some(self.world_matrix(parent).unwrap_or(Mat4::IDENTITY) * local),
            None => Some(local),
        }
    }

    /// Set the local transform so the world matrix becomes `world`.
    ///
    /// Under a collapsed parent the local transform is left unchanged.
    pub fn set_world_matrix(&mut self, id: Uuid, world: Mat4) -> Result<(), SceneError> {
        let parent_world = self
            .parent(id)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);
        let local = Transform::from_mat4(&(parent_world.inverse() * world));
        if parent_world.determinant().abs() < SINGULAR_DETERMINANT || !local.is_finite() {
            tracing::warn!("Keeping local transform of {}: no finite solution", id);
            return Err(SceneError::DegenerateTransform(id));
        }

        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::EntityNotFound(id))?;
        entity.local = local;
        Ok(())
    }

    pub fn world_translation(&self, id: Uuid) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    pub fn set_world_translation(&mut self, id: Uuid, translation: Vec3) -> Result<(), SceneError> {
        let world = self
            .world_matrix(id)
            .ok_or(SceneError::EntityNotFound(id))?;
        let (scale, rotation, _) = world.to_scale_rotation_translation();
        self.set_world_matrix(
            id,
            Mat4::from_scale_rotation_translation(scale, rotation, translation),
        )
    }

    /// Rotate around the entity's own pivot by a world-space rotation
    pub fn rotate_world(&mut self, id: Uuid, rotation: Quat) -> Result<(), SceneError> {
        let world = self
            .world_matrix(id)
            .ok_or(SceneError::EntityNotFound(id))?;
        let (scale, current, translation) = world.to_scale_rotation_translation();
        self.set_world_matrix(
            id,
            Mat4::from_scale_rotation_translation(
                scale,
                (rotation * current).normalize(),
                translation,
            ),
        )
    }

    /// Multiply the local scale component-wise. No component shrinks below
    /// [`MIN_SCALE`] in magnitude; mirrored axes keep their sign.
    pub fn scale_local(&mut self, id: Uuid, factor: Vec3) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::EntityNotFound(id))?;
        let scaled = entity.local.scale * factor;
        entity.local.scale = Vec3::select(
            scaled.cmplt(Vec3::ZERO),
            scaled.min(Vec3::splat(-MIN_SCALE)),
            scaled.max(Vec3::splat(MIN_SCALE)),
        );
        Ok(())
    }

    /// Bounds of the entity in world space
    pub fn world_bounds(&self, id: Uuid) -> Option<BoundingBox> {
        let entity = self.entities.get(&id)?;
        let world = self.world_matrix(id)?;
        Some(entity.local_bounds.transformed(&world))
    }

    // Structure edits
    //////////////////////////////////////////

    /// Remove `id` and everything below it.
    pub fn remove_subtree(&mut self, id: Uuid) -> Option<DetachedSubtree> {
        if !self.contains(id) {
            return None;
        }

        let parent = self.parent(id);
        let sibling_index = parent
            .map(|p| self.children(p).iter().position(|c| *c == id).unwrap_or(0))
            .unwrap_or(0);

        if let Some(parent) = parent
            && let Some(p) = self.entities.get_mut(&parent)
        {
            p.children.retain(|c| *c != id);
        }

        let mut ids = vec![id];
        ids.extend(self.descendants(id));

        let entities = ids
            .iter()
            .filter_map(|eid| self.remove_entity_record(*eid))
            .collect();

        Some(DetachedSubtree {
            entities,
            parent,
            sibling_index,
        })
    }

    /// Put a removed subtree back where it was
    pub fn restore_subtree(&mut self, subtree: &DetachedSubtree) {
        let Some(root) = subtree.root_id() else {
            return;
        };

        for entity in &subtree.entities {
            self.order.push(entity.id);
            self.entities.insert(entity.id, entity.clone());
        }

        let parent = subtree.parent.filter(|p| self.contains(*p));
        if let Some(root_entity) = self.entities.get_mut(&root) {
            root_entity.parent = parent;
        }
        if let Some(parent) = parent
            && let Some(p) = self.entities.get_mut(&parent)
        {
            let index = subtree.sibling_index.min(p.children.len());
            p.children.insert(index, root);
        }
    }

    fn remove_entity_record(&mut self, id: Uuid) -> Option<Entity> {
        self.order.retain(|o| *o != id);
        self.selection.retain(|s| *s != id);
        self.entities.remove(&id)
    }

    /// Copy `id` and its hierarchy with fresh ids.
    ///
    /// Returned in parent-then-child order; the first copy has no parent and
    /// carries the local transform of the source.
    pub fn deep_copy(&self, id: Uuid) -> Vec<Entity> {
        let Some(source) = self.get(id) else {
            return Vec::new();
        };

        let mut ids = vec![id];
        ids.extend(self.descendants(id));

        let remap: HashMap<Uuid, Uuid> = ids.iter().map(|old| (*old, Uuid::new_v4())).collect();

        let mut copies: Vec<Entity> = ids
            .iter()
            .filter_map(|old| self.get(*old))
            .map(|e| {
                let mut copy = e.clone();
                copy.id = remap[&e.id];
                copy.parent = e.parent.and_then(|p| remap.get(&p).copied());
                copy.children = e.children.iter().filter_map(|c| remap.get(c).copied()).collect();
                copy
            })
            .collect();

        if let Some(root) = copies.first_mut() {
            root.parent = None;
            root.name = format!("{}_copy", source.name);
        }

        copies
    }

    // Selection
    //////////////////////////////////////////

    pub fn selection(&self) -> &[Uuid] {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selection.contains(&id)
    }

    /// The primary selection, i.e. the most recently selected entity
    pub fn current_selection(&self) -> Option<Uuid> {
        self.selection.last().copied()
    }

    pub fn is_current_selection(&self, id: Uuid) -> bool {
        self.current_selection() == Some(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn remove_from_selection(&mut self, id: Uuid) {
        self.selection.retain(|s| *s != id);
    }

    /// Move an already selected entity to the end of the list
    pub fn make_current_selection(&mut self, id: Uuid) {
        if let Some(pos) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(pos);
        }
        if self.contains(id) {
            self.selection.push(id);
        }
    }

    /// Select a single entity. Entities inside a prefab select the prefab root.
    pub fn add_to_selection(&mut self, id: Uuid, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        if !self.contains(id) {
            return;
        }

        let id = self.prefab_root(id).unwrap_or(id);
        if !self.is_selected(id) {
            self.selection.push(id);
        }
    }

    /// Apply a pick result to the selection.
    ///
    /// Without `additive` the selection is replaced. With `additive`, new
    /// entities are appended, while re-picking a selected entity either makes
    /// it current or, when it already is current (or the only selection),
    /// deselects it.
    pub fn add_ids_to_selection(&mut self, ids: &[Uuid], additive: bool) {
        let mut current = ids.iter().copied().find(|id| self.is_current_selection(*id));

        if !additive {
            self.clear_selection();
        }

        for id in ids.iter().copied() {
            if !additive {
                self.add_to_selection(id, true);
                continue;
            }

            if self.is_selected(id) {
                if self.selected_count() > 1 {
                    if ids.len() == 1 {
                        if self.is_current_selection(id) {
                            self.remove_from_selection(id);
                            if current == Some(id) {
                                current = None;
                            }
                        } else {
                            self.make_current_selection(id);
                        }
                    }
                } else {
                    self.remove_from_selection(id);
                    if current == Some(id) {
                        current = None;
                    }
                }
            } else {
                self.add_to_selection(id, true);
            }
        }

        if let Some(current) = current
            && self.is_selected(current)
        {
            self.make_current_selection(current);
        }
    }
}
