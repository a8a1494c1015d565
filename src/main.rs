use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gaterush::config::SimConfig;
use gaterush::game::constants::tick;
use gaterush::game::events::ChannelSink;
use gaterush::game::game_loop::GameLoop;
use gaterush::game::input_buffer::{InputBufferError, InputCommand, InputSender};
use gaterush::game::match_controller::format_time;
use gaterush::game::state::Side;

/// Delay between commander spawn attempts
const COMMAND_INTERVAL: Duration = Duration::from_millis(700);
const EVENT_CHANNEL_CAPACITY: usize = 4096;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Gaterush headless v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {} matches of {}, max energy {}",
        config.matches.total_matches,
        format_time(config.matches.effective_duration()),
        config.energy.max
    );

    let mut game = GameLoop::new(config.clone());
    let (sink, events) = ChannelSink::bounded(EVENT_CHANNEL_CAPACITY);
    game.subscribe(Box::new(sink));
    info!("Session {}", game.session_id());

    // Event lines go to stdout as JSON, logs stay on stderr
    let printer = tokio::task::spawn_blocking(move || {
        for event in events.iter() {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to encode event: {}", e),
            }
        }
    });

    let commander = tokio::spawn(run_commander(game.input_sender(), config.clone()));

    game.start();
    let mut interval = tokio::time::interval(Duration::from_millis(tick::DURATION_MS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let simulation = async {
        loop {
            interval.tick().await;
            game.tick(tick::DT);
            if game.is_finished() {
                break;
            }
        }
    };

    let finished = tokio::select! {
        _ = simulation => true,
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            false
        }
    };

    if finished {
        let score = game.controller().score();
        info!(
            "Game finished: {:?}, {}-{} after {} ticks",
            game.controller().final_outcome(),
            score.player,
            score.enemy,
            game.tick_count()
        );
    }

    commander.abort();
    // Dropping the loop closes the event channel and ends the printer
    drop(game);
    if let Err(e) = printer.await {
        warn!("Event printer stopped abnormally: {}", e);
    }

    info!("Simulation stopped");
    Ok(())
}

/// Stand-in for a human: spawns for a random side at a random point in its area
async fn run_commander(sender: InputSender, config: SimConfig) {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut interval = tokio::time::interval(COMMAND_INTERVAL);

    loop {
        interval.tick().await;
        let side = if rng.gen_bool(0.5) { Side::Player } else { Side::Enemy };
        let Some(area) = config.roster(side).spawn_area else {
            continue;
        };
        let point = area.random_point(&mut rng);
        match sender.try_send(InputCommand::Spawn { side, point }) {
            Ok(()) => {}
            Err(InputBufferError::Full) => warn!("Input buffer full, skipping command"),
            Err(InputBufferError::Disconnected) => break,
        }
    }
}
