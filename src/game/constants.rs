/// Match timing and game length
pub mod matches {
    /// Normal match duration in seconds
    pub const DURATION: f32 = 140.0;
    /// Match duration used when debug mode is on
    pub const DEBUG_DURATION: f32 = 5.0;
    /// Number of matches in a game
    pub const TOTAL: u32 = 3;
    /// Pause between the end of one match and the start of the next (seconds)
    pub const NEXT_MATCH_DELAY: f32 = 2.0;
}

/// Energy economy
pub mod energy {
    /// Pool capacity
    pub const MAX: f32 = 6.0;
    /// Regeneration per second
    pub const REGEN_RATE: f32 = 0.5;
    /// Cost of fielding one soldier
    pub const SPAWN_COST: f32 = 2.0;
}

/// Soldier movement and detection tuning
pub mod soldier {
    /// Inert time after spawning before the soldier acts
    pub const ACTIVATION_DELAY: f32 = 3.0;
    /// Attacker speed while seeking a ball or heading for the fence
    pub const AUTO_MOVE_SPEED: f32 = 1.5;
    /// Attacker speed while carrying a ball
    pub const CARRYING_SPEED: f32 = 0.75;
    /// Defender speed while chasing a carrier
    pub const CHASE_SPEED: f32 = 7.0;
    /// Defender speed while walking back to its post
    pub const RETURN_SPEED: f32 = 5.0;
    /// Defender is back at its post within this distance
    pub const RETURN_THRESHOLD: f32 = 0.1;
    /// Defender detection radius for ball carriers
    pub const DETECTION_RADIUS: f32 = 5.0;
    /// Chasing defender catches within this distance
    pub const CATCH_DISTANCE: f32 = 1.0;
    /// Defender inert time after a catch
    pub const DEFENDER_INACTIVE_TIME: f32 = 3.0;
    /// Caught attacker inert time
    pub const ATTACKER_INACTIVE_TIME: f32 = 2.0;
    /// Autonomous pickup range
    pub const PICKUP_RANGE: f32 = 2.0;
    /// Free balls within this range attract an attacker
    pub const BALL_DETECTION_RANGE: f32 = 5.0;
    /// Touching distance for gates and fences
    pub const STRUCTURE_CONTACT_RADIUS: f32 = 1.0;
}

/// Directed pass after a catch
pub mod pass {
    /// Impulse applied to a passed ball (unit mass)
    pub const FORCE: f32 = 5.0;
    /// Closest ally that may receive a pass
    pub const MIN_DISTANCE: f32 = 3.0;
    /// Farthest ally that may receive a pass
    pub const MAX_DISTANCE: f32 = 15.0;
    /// Directed catch tolerance (tighter than PICKUP_RANGE)
    pub const CATCH_RADIUS: f32 = 1.5;
    /// Length of the directed catch window
    pub const MAX_TIME: f32 = 0.5;
    /// Poll interval inside the directed catch window
    pub const CHECK_INTERVAL: f32 = 0.05;
}

/// Loose-ball kinematics
pub mod ball {
    /// Impulse of an undirected throw
    pub const THROW_FORCE: f32 = 10.0;
    /// Speed cap
    pub const MAX_SPEED: f32 = 20.0;
    /// Exponential ground drag per second
    pub const GROUND_DRAG: f32 = 1.0;
    /// Below this speed a loose ball is at rest
    pub const REST_SPEED: f32 = 0.05;
    /// Balls spawned per match by the attacking roster
    pub const PER_MATCH: u32 = 3;
    /// Delay between successive ball spawns
    pub const SPAWN_DELAY: f32 = 0.5;
    /// Spawn height offset above the roster spawn height
    pub const SPAWN_LIFT: f32 = 1.0;
}

/// Simulation stepping
pub mod tick {
    /// Headless driver tick rate in Hz
    pub const RATE: u32 = 30;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 30.0;
    /// Tick duration in milliseconds
    pub const DURATION_MS: u64 = 1000 / RATE as u64;
}
