//! Ray and frustum picking against the scene

use std::collections::HashSet;

use glam::Vec3;
use uuid::Uuid;

use crate::geometry::{Frustum, Ray};
use crate::scene::Scene;

/// Distance along the ray used as the pick position when nothing is hit
pub const MISS_DISTANCE: f32 = 10.0;

/// Result of one pick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickData {
    /// Picked entity, `None` on a miss
    pub entity: Option<Uuid>,
    /// World-space hit position
    pub position: Vec3,
    /// Billboard the hit went through before being resolved to `entity`
    pub proxy: Option<Uuid>,
}

impl PickData {
    pub fn miss(position: Vec3) -> Self {
        Self {
            entity: None,
            position,
            proxy: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.entity.is_some()
    }
}

impl Scene {
    /// Nearest entity hit by the ray whose world bounds it crosses.
    ///
    /// Entities in `ignore` are skipped. Hits on a billboard are rewritten to
    /// the entity it stands in for.
    pub fn pick_ray(&self, ray: &Ray, ignore: &[Uuid]) -> PickData {
        let mut closest: Option<(Uuid, f32)> = None;

        for entity in self.iter() {
            if ignore.contains(&entity.id) {
                continue;
            }
            let Some(bounds) = self.world_bounds(entity.id) else {
                continue;
            };
            if let Some(t) = bounds.intersect_ray(ray)
                && closest.is_none_or(|(_, best)| t < best)
            {
                closest = Some((entity.id, t));
            }
        }

        match closest {
            Some((id, t)) => self.resolve_proxy(PickData {
                entity: Some(id),
                position: ray.point_at(t),
                proxy: None,
            }),
            None => PickData::miss(ray.point_at(MISS_DISTANCE)),
        }
    }

    /// Every entity whose world bounds intersect the frustum.
    ///
    /// Billboards resolve to their targets; billboards without a live target
    /// are dropped and each real entity is reported once.
    pub fn pick_frustum(&self, frustum: &Frustum, ignore: &[Uuid]) -> Vec<PickData> {
        let hits: Vec<PickData> = self
            .iter()
            .filter(|e| !ignore.contains(&e.id))
            .filter_map(|e| {
                let bounds = self.world_bounds(e.id)?;
                frustum.intersects_box(&bounds).then(|| PickData {
                    entity: Some(e.id),
                    position: bounds.center(),
                    proxy: None,
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut picked = Vec::with_capacity(hits.len());

        // Direct hits claim their entity before any proxy does.
        for hit in hits.iter().filter(|h| !self.is_billboard(h.entity)) {
            if let Some(id) = hit.entity
                && seen.insert(id)
            {
                picked.push(*hit);
            }
        }

        for hit in hits.iter().filter(|h| self.is_billboard(h.entity)) {
            let resolved = self.resolve_proxy(*hit);
            if resolved.proxy.is_none() {
                // Billboard with no live target.
                continue;
            }
            if let Some(id) = resolved.entity
                && seen.insert(id)
            {
                picked.push(resolved);
            }
        }

        picked
    }

    fn is_billboard(&self, id: Option<Uuid>) -> bool {
        id.and_then(|id| self.get(id))
            .is_some_and(|e| matches!(e.kind, crate::entity::EntityKind::Billboard { .. }))
    }

    /// Rewrite a billboard hit to the entity it represents
    fn resolve_proxy(&self, pick: PickData) -> PickData {
        let Some(hit) = pick.entity.and_then(|id| self.get(id)) else {
            return pick;
        };
        match hit.billboard_target() {
            // A billboard never resolves onto itself.
            Some(target) if target != hit.id && self.contains(target) => PickData {
                entity: Some(target),
                position: pick.position,
                proxy: Some(hit.id),
            },
            _ => pick,
        }
    }
}
