//! Axis-aligned collision detection
//!
//! One overlap pass per tick between the player and every live entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, Hazard, Obstacle, Pickup};

/// Axis-aligned bounding box (screen space, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Strict overlap: touching edges do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Anything the player can touch
pub trait Collidable {
    fn id(&self) -> EntityId;
    fn overlaps(&self, other: &Aabb) -> bool;
}

impl Obstacle {
    /// Upper and lower pieces. Both extend without bound away from the gap so
    /// flying over the top of the screen still hits the pipe.
    pub fn pieces(&self) -> [Aabb; 2] {
        let upper = Aabb::new(
            Vec2::new(self.x, f32::NEG_INFINITY),
            Vec2::new(self.x + self.width, self.gap_min_y()),
        );
        let lower = Aabb::new(
            Vec2::new(self.x, self.gap_max_y()),
            Vec2::new(self.x + self.width, f32::INFINITY),
        );
        [upper, lower]
    }
}

impl Collidable for Obstacle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        self.pieces().iter().any(|piece| piece.overlaps(other))
    }
}

impl Hazard {
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

impl Collidable for Hazard {
    fn id(&self) -> EntityId {
        self.id
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        self.hitbox().overlaps(other)
    }
}

impl Pickup {
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(self.size))
    }
}

impl Collidable for Pickup {
    fn id(&self) -> EntityId {
        self.id
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        self.hitbox().overlaps(other)
    }
}

/// One player overlap found this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Obstacle(EntityId),
    Hazard(EntityId),
    Pickup(EntityId),
}

impl Contact {
    pub fn id(&self) -> EntityId {
        match *self {
            Contact::Obstacle(id) | Contact::Hazard(id) | Contact::Pickup(id) => id,
        }
    }

    pub fn is_lethal(&self) -> bool {
        !matches!(self, Contact::Pickup(_))
    }
}

/// All contacts with `player`, in spawn order.
///
/// Obstacles report a contact only when an overlap starts; their `touching`
/// latch is updated here. Hazards and pickups report every overlap (they are
/// removed on contact anyway).
pub fn detect_contacts(
    player: &Aabb,
    obstacles: &mut [Obstacle],
    hazards: &[Hazard],
    pickups: &[Pickup],
) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for obstacle in obstacles.iter_mut() {
        let overlapping = obstacle.overlaps(player);
        if overlapping && !obstacle.touching {
            contacts.push(Contact::Obstacle(obstacle.id));
        }
        obstacle.touching = overlapping;
    }
    contacts.extend(
        hazards
            .iter()
            .filter(|h| h.overlaps(player))
            .map(|h| Contact::Hazard(h.id)),
    );
    contacts.extend(
        pickups
            .iter()
            .filter(|p| p.overlaps(player))
            .map(|p| Contact::Pickup(p.id)),
    );

    contacts.sort_by_key(Contact::id);
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hazards::HazardKind;
    use crate::sim::modifiers::ModifierKind;

    fn obstacle(id: EntityId, x: f32) -> Obstacle {
        Obstacle {
            id,
            x,
            width: 64.0,
            gap_center_y: 300.0,
            gap: 200.0,
            passed: false,
            touching: false,
        }
    }

    fn player_at(x: f32, y: f32) -> Aabb {
        Aabb::from_center(Vec2::new(x, y), Vec2::new(34.0, 24.0))
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        assert!(a.overlaps(&Aabb::new(Vec2::splat(5.0), Vec2::splat(15.0))));
        let edge = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(!a.overlaps(&edge));
        let apart = Aabb::new(Vec2::splat(20.0), Vec2::splat(30.0));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_player_inside_gap_is_safe() {
        let pipe = obstacle(1, 60.0);
        assert!(!pipe.overlaps(&player_at(80.0, 300.0)));
        assert!(pipe.overlaps(&player_at(80.0, 195.0)));
        assert!(pipe.overlaps(&player_at(80.0, 410.0)));
    }

    #[test]
    fn test_pipe_extends_above_screen() {
        let pipe = obstacle(1, 60.0);
        assert!(pipe.overlaps(&player_at(80.0, -25.0)));
    }

    #[test]
    fn test_obstacle_contact_fires_once_per_overlap() {
        let mut obstacles = vec![obstacle(1, 60.0)];
        let player = player_at(80.0, 150.0);

        let first = detect_contacts(&player, &mut obstacles, &[], &[]);
        assert_eq!(first, vec![Contact::Obstacle(1)]);
        let second = detect_contacts(&player, &mut obstacles, &[], &[]);
        assert!(second.is_empty());

        let clear = player_at(80.0, 300.0);
        assert!(detect_contacts(&clear, &mut obstacles, &[], &[]).is_empty());
        assert_eq!(detect_contacts(&player, &mut obstacles, &[], &[]).len(), 1);
    }

    #[test]
    fn test_contacts_sorted_by_spawn_order() {
        let player = player_at(80.0, 300.0);
        let hazards = [Hazard {
            id: 2,
            kind: HazardKind::Bullet,
            pos: Vec2::new(80.0, 300.0),
            vel: Vec2::new(-3000.0, 0.0),
            size: Vec2::splat(24.0),
        }];
        let pickups = [Pickup {
            id: 1,
            kind: ModifierKind::Immunity,
            pos: Vec2::new(85.0, 305.0),
            speed_x: 352.0,
            drift_dir: 0.0,
            size: 32.0,
        }];
        let contacts = detect_contacts(&player, &mut [], &hazards, &pickups);
        assert_eq!(contacts, vec![Contact::Pickup(1), Contact::Hazard(2)]);
        assert!(!contacts[0].is_lethal());
        assert!(contacts[1].is_lethal());
    }
}
