//! Lock-free input buffer
//!
//! Uses crossbeam-channel for lock-free MPSC communication from input
//! sources to the game loop. The loop drains it once at the start of a tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::game::state::Side;
use crate::util::vec2::Vec2;

/// Discrete command from an input source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputCommand {
    /// Spawn a soldier for `side` at a ground point
    Spawn { side: Side, point: Vec2 },
    /// Spawn for the currently selected cursor side
    SpawnAtCursor { point: Vec2 },
    /// Flip which side cursor spawns apply to
    SwitchSpawnSide,
    TogglePause,
}

/// Bounded command queue
///
/// Any number of sources can submit without blocking; the game loop
/// drains every pending command at the start of each tick.
pub struct InputBuffer {
    sender: Sender<InputCommand>,
    receiver: Receiver<InputCommand>,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Cloneable handle for an input source
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit a command (non-blocking).
    /// Returns false if the buffer is full.
    #[inline]
    pub fn try_submit(&self, command: InputCommand) -> bool {
        self.sender.try_send(command).is_ok()
    }

    /// Drain all pending commands for this tick, in submission order
    pub fn drain(&self) -> Vec<InputCommand> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(256)
    }
}

#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputCommand>,
}

impl InputSender {
    /// Submit a command (non-blocking)
    #[inline]
    pub fn try_send(&self, command: InputCommand) -> Result<(), InputBufferError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => InputBufferError::Full,
            TrySendError::Disconnected(_) => InputBufferError::Disconnected,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    /// Buffer is full (backpressure)
    #[error("input buffer full")]
    Full,
    /// Game loop dropped its buffer
    #[error("input buffer disconnected")]
    Disconnected,
}
