use crate::game::ball::Ball;
use crate::game::soldier::{Soldier, SoldierState};
use crate::game::systems::{Action, WorldView};

/// Attacker decision for one tick
pub fn decide(soldier: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    match soldier.state {
        SoldierState::CarryingToGate => carry(soldier, view, dt),
        SoldierState::ChasingBall(ball_id) => match view.balls.get(ball_id) {
            Some(ball) if ball.is_free() => chase_ball(soldier, ball, view, dt),
            // Taken by someone else or gone: look again this tick
            _ => seek(soldier, view, dt, true),
        },
        SoldierState::Seeking => seek(soldier, view, dt, false),
        _ => None,
    }
}

/// Nearest free ball strictly inside detection range
pub fn nearest_free_ball<'a>(soldier: &Soldier, view: &WorldView<'a>) -> Option<&'a Ball> {
    let range_sq = view.soldier.ball_detection_range * view.soldier.ball_detection_range;
    view.balls
        .values()
        .filter(|b| b.is_free())
        .map(|b| (b, soldier.position.distance_sq_to(b.position)))
        .filter(|(_, d)| *d < range_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(b, _)| b)
}

fn carry(soldier: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    let ball = soldier.held_ball?;
    // No gate resolved: stand still
    let gate = soldier.target_gate?;
    if soldier.position.distance_to(gate.position) <= view.soldier.structure_contact_radius {
        return Some(Action::TouchGate(ball));
    }
    let (position, facing) = soldier.step_toward(gate.position, view.soldier.carrying_speed * dt);
    Some(Action::Move {
        position,
        facing,
        state: SoldierState::CarryingToGate,
    })
}

fn chase_ball(soldier: &Soldier, ball: &Ball, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    if touching_fence(soldier, view) {
        return Some(Action::TouchFence);
    }
    if soldier.position.distance_to(ball.position) <= view.soldier.pickup_range {
        return Some(Action::PickUp(ball.id));
    }
    let (position, facing) = soldier.step_toward(ball.position, view.soldier.auto_move_speed * dt);
    Some(Action::Move {
        position,
        facing,
        state: SoldierState::ChasingBall(ball.id),
    })
}

/// No ball: go for the nearest free one, otherwise walk to the fence.
/// `lost_ball` forces a state change even when nothing else happens.
fn seek(soldier: &Soldier, view: &WorldView<'_>, dt: f32, lost_ball: bool) -> Option<Action> {
    if let Some(ball) = nearest_free_ball(soldier, view) {
        return chase_ball(soldier, ball, view, dt);
    }
    if touching_fence(soldier, view) {
        return Some(Action::TouchFence);
    }
    let stand = Action::Move {
        position: soldier.position,
        facing: soldier.facing,
        state: SoldierState::Seeking,
    };
    let fence = match soldier.target_fence {
        Some(fence) => fence,
        None if lost_ball => return Some(stand),
        None => return None,
    };
    let (position, facing) = soldier.step_toward(fence.position, view.soldier.auto_move_speed * dt);
    Some(Action::Move {
        position,
        facing,
        state: SoldierState::Seeking,
    })
}

fn touching_fence(soldier: &Soldier, view: &WorldView<'_>) -> bool {
    soldier.held_ball.is_none()
        && soldier.target_fence.map_or(false, |fence| {
            soldier.position.distance_to(fence.position) <= view.soldier.structure_contact_radius
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Side, SoldierId};
    use crate::game::systems::test_support::Field;
    use crate::util::vec2::Vec2;

    fn moved_to(action: Option<Action>) -> (Vec2, SoldierState) {
        match action {
            Some(Action::Move { position, state, .. }) => (position, state),
            other => panic!("expected a move, got {:?}", other),
        }
    }

    #[test]
    fn test_no_ball_heads_for_enemy_fence() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let soldier = field.soldier(Side::Player, id).clone();
        let fence = soldier.target_fence.unwrap().position;
        let (position, state) = moved_to(decide(&soldier, &field.view(), 1.0));
        assert_eq!(state, SoldierState::Seeking);
        let before = soldier.position.distance_to(fence);
        let after = position.distance_to(fence);
        assert!((before - after - 1.5).abs() < 0.001, "moves at auto speed");
    }

    #[test]
    fn test_touching_fence_without_ball() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let fence = field.soldier(Side::Player, id).target_fence.unwrap().position;
        field.soldier_mut(Side::Player, id).position = fence + Vec2::new(0.5, 0.0);
        let soldier = field.soldier(Side::Player, id).clone();
        assert_eq!(decide(&soldier, &field.view(), 0.1), Some(Action::TouchFence));
    }

    #[test]
    fn test_chases_nearest_free_ball_in_range() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let far = field.add_ball(Vec2::new(4.0, -8.0));
        let near = field.add_ball(Vec2::new(-3.0, -8.0));
        field.add_ball(Vec2::new(0.0, 0.0)); // out of detection range
        let soldier = field.soldier(Side::Player, id).clone();
        let (_, state) = moved_to(decide(&soldier, &field.view(), 0.1));
        assert_eq!(state, SoldierState::ChasingBall(near));
        assert_ne!(state, SoldierState::ChasingBall(far));
    }

    #[test]
    fn test_picks_up_within_range() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let ball = field.add_ball(Vec2::new(1.5, -8.0));
        let soldier = field.soldier(Side::Player, id).clone();
        assert_eq!(decide(&soldier, &field.view(), 0.1), Some(Action::PickUp(ball)));
    }

    #[test]
    fn test_ignores_ball_in_pass_window() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let ball = field.add_ball(Vec2::new(1.0, -8.0));
        field.balls.pickup(ball, SoldierId(99)).unwrap();
        field
            .balls
            .throw(ball, SoldierId(99), Vec2::FORWARD, 5.0, 20.0, Some(SoldierId(98)))
            .unwrap();
        let soldier = field.soldier(Side::Player, id).clone();
        let (_, state) = moved_to(decide(&soldier, &field.view(), 0.1));
        assert_eq!(state, SoldierState::Seeking);
    }

    #[test]
    fn test_reseeks_when_target_ball_taken() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let ball = field.add_ball(Vec2::new(4.0, -8.0));
        field.soldier_mut(Side::Player, id).state = SoldierState::ChasingBall(ball);
        field.balls.pickup(ball, SoldierId(99)).unwrap();
        let soldier = field.soldier(Side::Player, id).clone();
        let (_, state) = moved_to(decide(&soldier, &field.view(), 0.1));
        assert_eq!(state, SoldierState::Seeking);
    }

    #[test]
    fn test_carrier_moves_slowly_then_touches_gate() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        let ball = field.give_ball(Side::Player, id);
        let soldier = field.soldier(Side::Player, id).clone();
        let gate = soldier.target_gate.unwrap().position;
        let (position, state) = moved_to(decide(&soldier, &field.view(), 1.0));
        assert_eq!(state, SoldierState::CarryingToGate);
        assert!((soldier.position.distance_to(gate) - position.distance_to(gate) - 0.75).abs() < 0.001);

        field.soldier_mut(Side::Player, id).position = gate + Vec2::new(0.0, -0.9);
        let soldier = field.soldier(Side::Player, id).clone();
        assert_eq!(decide(&soldier, &field.view(), 0.1), Some(Action::TouchGate(ball)));
    }

    #[test]
    fn test_carrier_ignores_fence() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        field.give_ball(Side::Player, id);
        let fence = field.soldier(Side::Player, id).target_fence.unwrap().position;
        field.soldier_mut(Side::Player, id).position = fence;
        let soldier = field.soldier(Side::Player, id).clone();
        assert!(!matches!(decide(&soldier, &field.view(), 0.1), Some(Action::TouchFence)));
    }

    #[test]
    fn test_ball_on_detection_edge_ignored() {
        let mut field = Field::new(Side::Player);
        let id = field.add(Side::Player, Vec2::new(0.0, -8.0));
        field.add_ball(Vec2::new(5.0, -8.0));
        let soldier = field.soldier(Side::Player, id).clone();
        assert!(nearest_free_ball(&soldier, &field.view()).is_none());
        let (_, state) = moved_to(decide(&soldier, &field.view(), 0.1));
        assert_eq!(state, SoldierState::Seeking);
    }
}
