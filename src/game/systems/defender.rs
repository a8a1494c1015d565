use crate::game::soldier::{Soldier, SoldierState};
use crate::game::state::Role;
use crate::game::systems::{Action, WorldView};

/// Defender decision for one tick
pub fn decide(soldier: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    match soldier.state {
        SoldierState::Standby => {
            let target = acquire_target(soldier, view)?;
            chase(soldier, target, view, dt)
        }
        // Rescan every tick: the nearest carrier wins, nobody in radius ends the chase
        SoldierState::Chasing(_) => match acquire_target(soldier, view) {
            Some(target) => chase(soldier, target, view, dt),
            None => return_to_post(soldier, view, dt),
        },
        SoldierState::Returning => return_to_post(soldier, view, dt),
        _ => None,
    }
}

/// Enemy attacker carrying a ball and able to act
pub fn is_valid_target(target: &Soldier) -> bool {
    target.role == Role::Attacker && target.is_carrying() && !target.is_inert()
}

/// Nearest valid carrier strictly inside the detection radius. Equal distances resolve in
/// roster iteration order, which is unspecified.
pub fn acquire_target<'a>(soldier: &Soldier, view: &WorldView<'a>) -> Option<&'a Soldier> {
    let radius_sq = view.soldier.detection_radius * view.soldier.detection_radius;
    view.roster(soldier.side.opponent())
        .soldiers()
        .values()
        .filter(|s| is_valid_target(s))
        .map(|s| (s, soldier.position.distance_sq_to(s.position)))
        .filter(|(_, d)| *d < radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s)
}

fn chase(soldier: &Soldier, target: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    if soldier.position.distance_to(target.position) <= view.soldier.catch_distance {
        return Some(Action::Catch(target.id));
    }
    let (position, facing) = soldier.step_toward(target.position, view.soldier.chase_speed * dt);
    Some(Action::Move {
        position,
        facing,
        state: SoldierState::Chasing(target.id),
    })
}

fn return_to_post(soldier: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Action> {
    let post = soldier.spawn_position;
    let (position, facing) = soldier.step_toward(post, view.soldier.return_speed * dt);
    let state = if position.distance_to(post) <= view.soldier.return_threshold {
        SoldierState::Standby
    } else {
        SoldierState::Returning
    };
    Some(Action::Move {
        position,
        facing,
        state,
    })
}
