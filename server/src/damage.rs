//! Enemy-contact damage.
//!
//! A moving enemy adjacent to a player (Manhattan distance <= 1) hurts them
//! on a cooldown: half a second between touches at first, speeding up once
//! contact has been sustained past the threshold. A stationary enemy is
//! harmless. State is tracked per player, keyed off the room's player ids.

use std::collections::HashMap;

use log::info;

use crate::entities::{Enemy, EnemyId, Player, PlayerId};
use shared::{
    CONTACT_COOLDOWN_FIRST, CONTACT_COOLDOWN_SUSTAINED, CONTACT_DAMAGE,
    CONTACT_SUSTAIN_THRESHOLD,
};

#[derive(Debug, Clone, Default)]
struct ContactState {
    /// Seconds of continuous contact with the same enemy.
    duration: f32,
    /// Seconds until damage may apply again.
    cooldown: f32,
    last_enemy: Option<EnemyId>,
}

/// Per-player contact bookkeeping for one room.
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    states: HashMap<PlayerId, ContactState>,
}

fn in_contact(player: (i32, i32), enemy: (i32, i32)) -> bool {
    let dx = (player.0 - enemy.0).abs();
    let dy = (player.1 - enemy.1).abs();
    dx + dy <= 1
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops state for a player who left the room.
    pub fn remove_player(&mut self, id: PlayerId) {
        self.states.remove(&id);
    }

    /// Checks proximity between one player and one enemy and applies contact
    /// damage if it is due. Returns true if damage was dealt.
    pub fn check_and_apply(
        &mut self,
        player: &mut Player,
        enemy: &Enemy,
        enemy_moved: bool,
        delta: f32,
    ) -> bool {
        let touching = enemy_moved && in_contact(player.position, enemy.position);

        let state = self.states.entry(player.id).or_default();
        state.cooldown = (state.cooldown - delta).max(0.0);

        if touching {
            if state.last_enemy == Some(enemy.id) {
                state.duration += delta;
            } else {
                state.duration = delta;
                state.last_enemy = Some(enemy.id);
            }
        } else {
            state.duration = 0.0;
            state.last_enemy = None;
            return false;
        }

        if state.cooldown > 0.0 {
            return false;
        }

        state.cooldown = if state.duration >= CONTACT_SUSTAIN_THRESHOLD {
            CONTACT_COOLDOWN_SUSTAINED
        } else {
            CONTACT_COOLDOWN_FIRST
        };
        state.duration = 0.0;

        player.take_damage(CONTACT_DAMAGE);
        info!(
            "Enemy {} hit player {} ({} hp left)",
            enemy.id, player.name, player.health
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{EnemyKind, MAX_HEALTH};

    fn player_at(x: i32, y: i32) -> Player {
        let mut p = Player::new(1, "alice".to_string());
        p.position = (x, y);
        p
    }

    fn enemy_at(x: i32, y: i32) -> Enemy {
        Enemy::new(0, EnemyKind::Chasing, (x, y))
    }

    #[test]
    fn test_first_touch_damages_and_starts_cooldown() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let enemy = enemy_at(3, 4);

        assert!(tracker.check_and_apply(&mut player, &enemy, true, 0.033));
        assert_eq!(player.health, MAX_HEALTH - CONTACT_DAMAGE);

        // Immediately after, the cooldown suppresses further damage
        assert!(!tracker.check_and_apply(&mut player, &enemy, true, 0.033));
        assert_eq!(player.health, MAX_HEALTH - CONTACT_DAMAGE);
    }

    #[test]
    fn test_damage_resumes_after_cooldown() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let enemy = enemy_at(3, 4);

        assert!(tracker.check_and_apply(&mut player, &enemy, true, 0.033));
        assert!(!tracker.check_and_apply(&mut player, &enemy, true, 0.2));
        assert!(tracker.check_and_apply(
            &mut player,
            &enemy,
            true,
            CONTACT_COOLDOWN_FIRST
        ));
        assert_eq!(player.health, MAX_HEALTH - 2 * CONTACT_DAMAGE);
    }

    #[test]
    fn test_stationary_enemy_is_harmless() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let enemy = enemy_at(3, 4);

        assert!(!tracker.check_and_apply(&mut player, &enemy, false, 1.0));
        assert_eq!(player.health, MAX_HEALTH);
    }

    #[test]
    fn test_out_of_range_resets_contact() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let near = enemy_at(3, 4);
        let far = enemy_at(7, 7);

        tracker.check_and_apply(&mut player, &near, true, 0.033);
        tracker.check_and_apply(&mut player, &far, true, 0.033);
        let state = tracker.states.get(&player.id).unwrap();
        assert_approx_eq!(state.duration, 0.0, 1e-6);
        assert_eq!(state.last_enemy, None);
    }

    #[test]
    fn test_sustained_contact_uses_faster_cooldown() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let enemy = enemy_at(3, 4);

        // First touch, then a contact window long enough to cross the
        // sustained threshold once the cooldown has run down.
        assert!(tracker.check_and_apply(&mut player, &enemy, true, 0.033));
        assert!(tracker.check_and_apply(
            &mut player,
            &enemy,
            true,
            CONTACT_SUSTAIN_THRESHOLD
        ));
        let state = tracker.states.get(&player.id).unwrap();
        assert_approx_eq!(state.cooldown, CONTACT_COOLDOWN_SUSTAINED, 1e-6);
    }

    #[test]
    fn test_diagonal_is_not_contact() {
        let mut tracker = ContactTracker::new();
        let mut player = player_at(3, 3);
        let enemy = enemy_at(4, 4);
        assert!(!tracker.check_and_apply(&mut player, &enemy, true, 0.033));
        assert_eq!(player.health, MAX_HEALTH);
    }
}
