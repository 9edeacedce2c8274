//! Undo/redo action stack
//!
//! History is a single list of reversible [`Action`]s with a pointer
//! separating applied entries from undone ones. Several actions can be
//! folded into an [`ActionGroup`] that is undone and redone as one step.

use edit_core::{AnchorRatios, DetachedSubtree, Entity, Scene, Transform};
use uuid::Uuid;

/// Default number of history entries kept
pub const DEFAULT_MAX_ACTIONS: usize = 100;

/// A reversible scene edit.
///
/// Actions are recorded after their effect is already in the scene, so the
/// first call after recording is always `undo`.
pub trait Action {
    fn name(&self) -> &str;

    fn undo(&mut self, scene: &mut Scene);

    fn redo(&mut self, scene: &mut Scene);

    /// Child actions when this is a group
    fn children(&self) -> &[Box<dyn Action>] {
        &[]
    }
}

/// Actions undone in reverse order and redone in order, as one history step
pub struct ActionGroup {
    name: String,
    actions: Vec<Box<dyn Action>>,
}

impl ActionGroup {
    pub fn new(name: impl Into<String>, actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for ActionGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self, scene: &mut Scene) {
        for action in self.actions.iter_mut().rev() {
            action.undo(scene);
        }
    }

    fn redo(&mut self, scene: &mut Scene) {
        for action in self.actions.iter_mut() {
            action.redo(scene);
        }
    }

    fn children(&self) -> &[Box<dyn Action>] {
        &self.actions
    }
}

/// Bounded linear history
pub struct ActionManager {
    actions: Vec<Box<dyn Action>>,
    /// Number of applied entries; everything at or after it has been undone
    pointer: usize,
    max_actions: usize,
    /// Eviction is held back while a group is being recorded
    grouping: bool,
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIONS)
    }
}

impl ActionManager {
    pub fn new(max_actions: usize) -> Self {
        Self {
            actions: Vec::new(),
            pointer: 0,
            max_actions: max_actions.max(1),
            grouping: false,
        }
    }

    /// Record an action whose effect is already applied.
    ///
    /// Anything undone and not redone is discarded first.
    pub fn add_action(&mut self, action: Box<dyn Action>) {
        if self.pointer < self.actions.len() {
            tracing::debug!(
                "Discarding {} undone action(s)",
                self.actions.len() - self.pointer
            );
            self.actions.truncate(self.pointer);
        }

        tracing::debug!("Action added: {}", action.name());
        self.actions.push(action);
        self.pointer = self.actions.len();

        if !self.grouping {
            self.enforce_limit();
        }
    }

    /// Start recording actions that will be folded into one group
    pub fn begin_action_group(&mut self) {
        self.grouping = true;
    }

    /// Fold the `count` most recent actions into one group
    pub fn group_last_actions(&mut self, count: usize, name: impl Into<String>) {
        self.grouping = false;

        let count = count.min(self.actions.len());
        if count > 0 {
            let start = self.actions.len() - count;
            let grouped: Vec<Box<dyn Action>> = self.actions.drain(start..).collect();
            let group = ActionGroup::new(name, grouped);
            tracing::debug!("Grouped {} actions as {}", group.len(), group.name());
            self.actions.push(Box::new(group));
            self.pointer = self.actions.len();
        }

        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        while self.actions.len() > self.max_actions {
            let evicted = self.actions.remove(0);
            self.pointer = self.pointer.saturating_sub(1);
            tracing::debug!("History full, evicted {}", evicted.name());
        }
    }

    /// Undo one history step. Returns false at the start of history.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        if self.pointer == 0 {
            return false;
        }
        self.pointer -= 1;
        let action = &mut self.actions[self.pointer];
        tracing::debug!("Undo: {}", action.name());
        action.undo(scene);
        true
    }

    /// Redo one history step. Returns false at the end of history.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        if self.pointer >= self.actions.len() {
            return false;
        }
        let action = &mut self.actions[self.pointer];
        tracing::debug!("Redo: {}", action.name());
        action.redo(scene);
        self.pointer += 1;
        true
    }

    /// Drop the whole history
    pub fn clear_all_actions(&mut self) {
        self.actions.clear();
        self.pointer = 0;
        self.grouping = false;
    }

    /// Drop the most recent action without running it
    pub fn remove_last_action(&mut self) -> Option<Box<dyn Action>> {
        let action = self.actions.pop()?;
        self.pointer = self.pointer.min(self.actions.len());
        tracing::debug!("Action removed: {}", action.name());
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.actions.len()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn max_actions(&self) -> usize {
        self.max_actions
    }

    pub fn set_max_actions(&mut self, max_actions: usize) {
        self.max_actions = max_actions.max(1);
        self.enforce_limit();
    }

    /// Most recently recorded action
    pub fn last_action(&self) -> Option<&dyn Action> {
        self.actions.last().map(|a| a.as_ref())
    }

    pub fn actions(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(|a| a.as_ref())
    }
}

// Concrete actions
//////////////////////////////////////////

/// Local transform change of one entity.
///
/// Snapshots are taken relative to the parent, so the entities of a group
/// can be restored in any order.
pub struct TransformAction {
    entity: Uuid,
    before: Transform,
    /// Captured on first undo, once the gesture is over
    after: Option<Transform>,
}

impl TransformAction {
    /// Snapshot the entity's current local transform
    pub fn new(scene: &Scene, entity: Uuid) -> Option<Self> {
        let before = scene.get(entity)?.local;
        Some(Self {
            entity,
            before,
            after: None,
        })
    }

    pub fn entity(&self) -> Uuid {
        self.entity
    }

    fn restore(&self, scene: &mut Scene, transform: Transform) -> bool {
        match scene.get_mut(self.entity) {
            Some(entity) => {
                entity.local = transform;
                true
            }
            None => false,
        }
    }
}

impl Action for TransformAction {
    fn name(&self) -> &str {
        "Transform"
    }

    fn undo(&mut self, scene: &mut Scene) {
        if self.after.is_none() {
            self.after = scene.get(self.entity).map(|e| e.local);
        }
        if !self.restore(scene, self.before) {
            tracing::warn!("Transform undo skipped: {} not in scene", self.entity);
        }
    }

    fn redo(&mut self, scene: &mut Scene) {
        if let Some(after) = self.after
            && !self.restore(scene, after)
        {
            tracing::warn!("Transform redo skipped: {} not in scene", self.entity);
        }
    }
}

/// Insertion of an entity hierarchy
pub struct CreateAction {
    root: Uuid,
    /// Present while the entities are out of the scene
    detached: Option<DetachedSubtree>,
}

impl CreateAction {
    /// Insert `entities` (root first) and record the insertion
    pub fn new(scene: &mut Scene, entities: Vec<Entity>) -> Option<Self> {
        let root = entities.first()?.id;
        for entity in entities {
            scene.add_entity(entity);
        }
        Some(Self {
            root,
            detached: None,
        })
    }

    pub fn root(&self) -> Uuid {
        self.root
    }
}

impl Action for CreateAction {
    fn name(&self) -> &str {
        "Create"
    }

    fn undo(&mut self, scene: &mut Scene) {
        if self.detached.is_none() {
            self.detached = scene.remove_subtree(self.root);
        }
    }

    fn redo(&mut self, scene: &mut Scene) {
        if let Some(subtree) = self.detached.take() {
            scene.restore_subtree(&subtree);
        }
    }
}

/// Removal of one entity, along with whatever is still parented below it
pub struct DeleteAction {
    entity: Uuid,
    detached: Option<DetachedSubtree>,
}

impl DeleteAction {
    /// Remove the entity now and record the removal
    pub fn new(scene: &mut Scene, entity: Uuid) -> Option<Self> {
        let detached = scene.remove_subtree(entity)?;
        Some(Self {
            entity,
            detached: Some(detached),
        })
    }

    pub fn entity(&self) -> Uuid {
        self.entity
    }
}

impl Action for DeleteAction {
    fn name(&self) -> &str {
        "Delete"
    }

    fn undo(&mut self, scene: &mut Scene) {
        if let Some(subtree) = self.detached.take() {
            scene.restore_subtree(&subtree);
        }
    }

    fn redo(&mut self, scene: &mut Scene) {
        if self.detached.is_none() {
            self.detached = scene.remove_subtree(self.entity);
        }
    }
}

/// Anchor ratio change of one surface
pub struct AnchorAction {
    entity: Uuid,
    before: AnchorRatios,
    after: Option<AnchorRatios>,
}

impl AnchorAction {
    pub fn new(scene: &Scene, entity: Uuid) -> Option<Self> {
        let before = *scene.get(entity)?.anchor()?;
        Some(Self {
            entity,
            before,
            after: None,
        })
    }

    /// Ratios the surface had when the action was recorded
    pub fn before(&self) -> AnchorRatios {
        self.before
    }

    fn set(scene: &mut Scene, entity: Uuid, ratios: AnchorRatios) {
        if let Some(anchor) = scene.get_mut(entity).and_then(|e| e.anchor_mut()) {
            *anchor = ratios;
        }
    }
}

impl Action for AnchorAction {
    fn name(&self) -> &str {
        "Anchor"
    }

    fn undo(&mut self, scene: &mut Scene) {
        if self.after.is_none() {
            self.after = scene.get(self.entity).and_then(|e| e.anchor().copied());
        }
        Self::set(scene, self.entity, self.before);
    }

    fn redo(&mut self, scene: &mut Scene) {
        if let Some(after) = self.after {
            Self::set(scene, self.entity, after);
        }
    }
}
