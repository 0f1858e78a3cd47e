//! Orb Arena headless driver
//!
//! Runs an offline session against an in-memory gateway with an autopilot that
//! walks to the nearest orb or area, then prints where the run ended up.
//!
//! Usage: `orb-arena [settings.json] [seconds]`

use glam::DVec2;

use orb_arena::net::MemoryGateway;
use orb_arena::sim::{GameEvent, SimState, TickInput};
use orb_arena::{Client, Settings};

/// Orbs and areas in a fresh offline world
const OFFLINE_ORBS: usize = 20;
const OFFLINE_AREAS: usize = 3;
const DEFAULT_RUN_SECS: u32 = 120;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    let run_secs = args
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_RUN_SECS);

    log::info!("Orb Arena (headless) starting, seed {}", settings.seed);
    let frames = frame_budget(run_secs, settings.frame_rate);

    let mut gateway = MemoryGateway::new();
    gateway.push_text(r#"{"type":"id","id":"local","session":"offline"}"#);
    let mut client = Client::new(settings, gateway);
    client.pump();
    populate_offline_world(client.state_mut());

    let mut levels = 0;
    let mut auto_applied = 0;
    for _ in 0..frames {
        *client.input_mut() = autopilot(client.state());
        client.step();
        client.gateway_mut().take_sent();

        for event in client.state_mut().drain_events() {
            match event {
                GameEvent::LeveledUp { .. } => levels += 1,
                GameEvent::UpgradeApplied { auto: true, .. } => auto_applied += 1,
                _ => {}
            }
        }
    }

    let state = client.state();
    println!("Simulated {} frames ({}s)", state.frame, run_secs);
    println!(
        "Level {} ({:.0}/{} xp), {} level-ups, {} auto-applied upgrades",
        state.progression.level,
        state.progression.xp,
        state.progression.xp_to_next,
        levels,
        auto_applied
    );
    println!(
        "Orbs left: {}, active areas: {}",
        state.world.orbs.len(),
        state.world.areas.iter().filter(|a| a.active).count()
    );
    println!("Stats: {:?}", state.stats);
}

/// Frames to simulate for a run, saturating on absurd arguments
fn frame_budget(run_secs: u32, frame_rate: u32) -> u32 {
    run_secs.saturating_mul(frame_rate.max(1))
}

/// Fill the world the way a fresh server session would
fn populate_offline_world(state: &mut SimState) {
    let mut world = std::mem::take(&mut state.world);
    world.scatter_orbs(state.rng(), OFFLINE_ORBS);
    world.scatter_areas(state.rng(), OFFLINE_AREAS);
    state.world = world;
}

/// Steer towards the nearest orb, falling back to the nearest area
fn autopilot(state: &SimState) -> TickInput {
    let Some(me) = state.world.local_player() else {
        return TickInput::default();
    };

    let target = nearest(me.pos, state.world.orbs.iter().map(|o| o.pos))
        .or_else(|| nearest(me.pos, state.world.areas.iter().map(|a| a.pos)));

    let mut input = TickInput {
        // Pick on odd levels, let the window run out on even ones
        choose_upgrade: (state.progression.is_choice_open() && state.progression.level % 2 == 1)
            .then_some(0),
        ..Default::default()
    };
    if let Some(target) = target {
        // Stop once close enough to drain it
        let delta = target - me.pos;
        let dead_zone = state.stats.speed;
        input.left = delta.x < -dead_zone;
        input.right = delta.x > dead_zone;
        input.up = delta.y < -dead_zone;
        input.down = delta.y > dead_zone;
        input.aim_at = Some(target);
    }
    input
}

fn nearest(from: DVec2, targets: impl Iterator<Item = DVec2>) -> Option<DVec2> {
    targets.min_by(|a, b| {
        a.distance(from)
            .partial_cmp(&b.distance(from))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}
