//! Presentation events
//!
//! The simulation queues `GameEvent`s while a tick runs and flushes them once
//! at the end of the tick, synchronously, to every registered sink in
//! registration order. Sinks are observers only; nothing they do feeds back
//! into the simulation.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::match_result::MatchEndReason;
use crate::game::roster::SpawnRejection;
use crate::game::state::{BallId, MatchResult, Role, Scoreboard, Side, SoldierId};
use crate::util::vec2::Vec2;

/// Why a soldier left the field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DestroyReason {
    /// Attacker touched the fence without a ball
    ReachedFence,
    /// Attacker carried its ball into the gate
    DeliveredBall,
    /// Removed at a match boundary
    MatchCleared,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    MatchStarted {
        match_index: u32,
        total_matches: u32,
        attacker: Side,
        duration: f32,
    },
    RoleChanged {
        side: Side,
        role: Role,
    },
    SoldierSpawned {
        side: Side,
        soldier: SoldierId,
        role: Role,
        position: Vec2,
        height: f32,
    },
    SoldierActivated {
        side: Side,
        soldier: SoldierId,
    },
    SoldierDestroyed {
        side: Side,
        soldier: SoldierId,
        reason: DestroyReason,
    },
    BallSpawned {
        ball: BallId,
        position: Vec2,
        height: f32,
    },
    BallPickedUp {
        ball: BallId,
        soldier: SoldierId,
    },
    BallThrown {
        ball: BallId,
        soldier: SoldierId,
        directed: bool,
        target: Option<SoldierId>,
    },
    PassCompleted {
        ball: BallId,
        receiver: SoldierId,
    },
    PassExpired {
        ball: BallId,
    },
    CatchOccurred {
        defender: SoldierId,
        attacker: SoldierId,
    },
    ScoreChanged {
        score: Scoreboard,
    },
    MatchEnded {
        match_index: u32,
        result: MatchResult,
        reason: MatchEndReason,
    },
    GameFinished {
        outcome: MatchResult,
        score: Scoreboard,
    },
    PauseChanged {
        paused: bool,
    },
    SpawnRejected {
        side: Side,
        reason: SpawnRejection,
    },
}

/// Observer for simulation events (rendering, audio, logging)
pub trait PresentationSink: Send {
    fn on_event(&mut self, event: &GameEvent);
}

/// Per-tick event queue plus ordered sink list
#[derive(Default)]
pub struct EventBus {
    queue: Vec<GameEvent>,
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn PresentationSink>) {
        self.sinks.push(sink);
    }

    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.queue.push(event);
    }

    /// Events queued since the last flush
    pub fn pending(&self) -> &[GameEvent] {
        &self.queue
    }

    /// Deliver queued events to every sink, then hand them back to the caller
    pub fn flush(&mut self) -> Vec<GameEvent> {
        let events = std::mem::take(&mut self.queue);
        for event in &events {
            for sink in self.sinks.iter_mut() {
                sink.on_event(event);
            }
        }
        events
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

/// Forwards events over a bounded channel without ever blocking the loop
pub struct ChannelSink {
    sender: Sender<GameEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<GameEvent>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end of a fresh channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<GameEvent>) {
        let (sender, receiver) = bounded(capacity);
        (Self::new(sender), receiver)
    }
}

impl PresentationSink for ChannelSink {
    fn on_event(&mut self, event: &GameEvent) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Event channel full, dropping event"),
            Err(TrySendError::Disconnected(_)) => debug!("Event receiver gone, dropping event"),
        }
    }
}
