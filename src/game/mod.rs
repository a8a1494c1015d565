pub mod ball;
pub mod constants;
pub mod energy;
pub mod events;
pub mod game_loop;
pub mod input_buffer;
pub mod match_controller;
pub mod match_result;
pub mod roster;
pub mod scheduler;
pub mod soldier;
pub mod spatial;
pub mod state;
pub mod structures;
pub mod systems;
