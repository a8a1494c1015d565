//! Gaterush simulation library
//!
//! Two-sided attack/defend ball game run as a fixed-step simulation: energy
//! funded spawns, autonomous soldiers, ball possession and directed passes,
//! and a best-of-N match state machine with role swaps.
//!
//! Presentation layers plug in through [`game::events::PresentationSink`] and
//! feed commands through [`game::input_buffer::InputSender`].

pub mod config;
pub mod game;
pub mod util;
