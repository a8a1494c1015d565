//! Pausable task scheduler
//!
//! Every deferred continuation in the simulation (activation delays,
//! incapacitation timers, pass-window polls, staggered ball spawns, the pause
//! between matches) is a `Task` held here with a due time on the simulation
//! clock. The clock only moves when `advance` is called, so pausing the loop
//! pauses every timer.

use serde::{Deserialize, Serialize};

use crate::game::state::{BallId, Side, SoldierId};

/// Task identifier, unique per scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// Entity a task belongs to. Cancelling an owner drops all of its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskOwner {
    Match,
    Roster(Side),
    Soldier(SoldierId),
    Ball(BallId),
}

/// Deferred continuation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Task {
    /// Spawn delay over, soldier starts acting
    ActivateSoldier(SoldierId),
    /// Post-catch inert time over
    EndIncapacitation(SoldierId),
    /// One staggered ball spawn for the attacking roster
    SpawnBall(Side),
    /// Directed-pass poll. `remaining` is the window time left at this poll.
    PassCheck {
        ball: BallId,
        target: SoldierId,
        remaining: f32,
    },
    /// Delay between matches over
    StartNextMatch,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: TaskId,
    due: f32,
    owner: TaskOwner,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: f32,
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time in seconds (paused time excluded)
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Schedule `task` to fire `delay` seconds from now.
    /// A zero delay fires on the next `advance`.
    pub fn schedule(&mut self, delay: f32, owner: TaskOwner, task: Task) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.push(ScheduledTask {
            id,
            due: self.now + delay.max(0.0),
            owner,
            task,
        });
        id
    }

    /// Move the clock forward and return every task now due, earliest first.
    /// Ties fire in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<Task> {
        if dt > 0.0 {
            self.now += dt;
        }
        let now = self.now;
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|t| {
            if t.due <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.task).collect()
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Drop every task owned by `owner`, returning how many were removed
    pub fn cancel_owner(&mut self, owner: TaskOwner) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn pending_for(&self, owner: TaskOwner) -> usize {
        self.tasks.iter().filter(|t| t.owner == owner).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_after_delay() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, TaskOwner::Match, Task::StartNextMatch);
        assert!(scheduler.advance(0.5).is_empty());
        assert_eq!(scheduler.advance(0.5), vec![Task::StartNextMatch]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_zero_delay_fires_next_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.0, TaskOwner::Roster(Side::Player), Task::SpawnBall(Side::Player));
        assert_eq!(scheduler.advance(0.0).len(), 1);
    }

    #[test]
    fn test_due_order_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.3, TaskOwner::Soldier(SoldierId(1)), Task::ActivateSoldier(SoldierId(1)));
        scheduler.schedule(0.1, TaskOwner::Soldier(SoldierId(2)), Task::ActivateSoldier(SoldierId(2)));
        scheduler.schedule(0.1, TaskOwner::Soldier(SoldierId(3)), Task::ActivateSoldier(SoldierId(3)));
        let fired = scheduler.advance(1.0);
        assert_eq!(
            fired,
            vec![
                Task::ActivateSoldier(SoldierId(2)),
                Task::ActivateSoldier(SoldierId(3)),
                Task::ActivateSoldier(SoldierId(1)),
            ]
        );
    }

    #[test]
    fn test_cancel_owner() {
        let mut scheduler = Scheduler::new();
        let soldier = SoldierId(5);
        scheduler.schedule(1.0, TaskOwner::Soldier(soldier), Task::ActivateSoldier(soldier));
        scheduler.schedule(2.0, TaskOwner::Soldier(soldier), Task::EndIncapacitation(soldier));
        scheduler.schedule(2.0, TaskOwner::Match, Task::StartNextMatch);
        assert_eq!(scheduler.cancel_owner(TaskOwner::Soldier(soldier)), 2);
        assert_eq!(scheduler.advance(5.0), vec![Task::StartNextMatch]);
    }

    #[test]
    fn test_cancel_single_task() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(1.0, TaskOwner::Match, Task::StartNextMatch);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(2.0).is_empty());
    }

    #[test]
    fn test_clock_does_not_move_without_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.5, TaskOwner::Match, Task::StartNextMatch);
        // A paused loop simply skips advance; nothing fires and time stands still
        assert_eq!(scheduler.now(), 0.0);
        assert_eq!(scheduler.pending_for(TaskOwner::Match), 1);
        assert!(scheduler.advance(0.4).is_empty());
        assert!((scheduler.now() - 0.4).abs() < 0.0001);
    }
}
