/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Particles (visual only)
///   2. Player movement (input → gravity → platforms → clamp → fall check)
///   3. Enemy patrol
///   4. Pickups
///   5. Enemy contact
///   6. Goal / door
///   7. Goal reveal
///   8. Countdown
///
/// Nothing runs unless the phase is `Playing`, and processing stops the
/// moment a stage moves the phase elsewhere. A tick that reaches the goal
/// therefore never also runs the countdown.

use rand::Rng;

use crate::domain::entity::{FrameInput, Particle};
use crate::domain::physics;
use crate::domain::rect::overlaps;
use super::event::GameEvent;
use super::world::{Phase, WorldState, POINTS_PER_COLLECTIBLE};

pub const BURST_COUNT: usize = 8;
const BURST_SPREAD: f32 = 20.0; // px
const BURST_SPEED: f32 = 100.0; // px/s, per axis

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_particles(world, dt);

    resolve_player_movement(world, input, dt, &mut events);
    if world.phase != Phase::Playing { return events; }

    for enemy in &mut world.level.enemies {
        physics::patrol(enemy, dt);
    }

    resolve_pickups(world, &mut events);
    resolve_enemy_contact(world, &mut events);
    if world.phase != Phase::Playing { return events; }

    resolve_goal(world, &mut events);
    if world.phase != Phase::Playing { return events; }
    resolve_door(world, &mut events);
    if world.phase != Phase::Playing { return events; }

    resolve_reveal(world, &mut events);
    resolve_countdown(world, dt, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(
    world: &mut WorldState,
    input: FrameInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let moved = physics::move_player(
        &mut world.player,
        input,
        world.level.platforms(),
        &world.physics,
        dt,
    );
    if moved.jumped {
        events.push(GameEvent::Jumped);
    }
    if moved.fell {
        hazard_hit(world, events);
    }
}

fn resolve_particles(world: &mut WorldState, dt: f32) {
    world.particles.retain_mut(|p| p.tick(dt));
}

// ══════════════════════════════════════════════════════════════
// Pickups & hazards
// ══════════════════════════════════════════════════════════════

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = world.player.rect();
    for c in world.level.collectibles.iter_mut().filter(|c| !c.collected) {
        if !overlaps(&player, &c.rect) { continue; }
        c.collected = true;
        world.score += POINTS_PER_COLLECTIBLE;
        events.push(GameEvent::Collected { x: c.rect.x, y: c.rect.y });
        spawn_burst(&mut world.particles, &mut world.rng, c.rect.x, c.rect.y);
    }
}

/// Sparkles for a pickup at (x, y).
pub fn spawn_burst(particles: &mut Vec<Particle>, rng: &mut impl Rng, x: f32, y: f32) {
    for _ in 0..BURST_COUNT {
        particles.push(Particle {
            x: x + rng.random_range(0.0..BURST_SPREAD),
            y: y + rng.random_range(0.0..BURST_SPREAD),
            vx: rng.random_range(-BURST_SPEED..BURST_SPEED),
            vy: rng.random_range(-BURST_SPEED..BURST_SPEED),
            life: 1.0,
        });
    }
}

fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.level.enemies.len() {
        if overlaps(&world.player.rect(), &world.level.enemies[i].rect()) {
            hazard_hit(world, events);
            if world.phase != Phase::Playing { return; }
        }
    }
}

/// Lose a life. The last life ends the session where the player stands;
/// otherwise the player goes back to the level spawn.
fn hazard_hit(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.lives = world.lives.saturating_sub(1);
    events.push(GameEvent::PlayerHit { lives_left: world.lives });

    if world.lives == 0 {
        world.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
        log::info!("game over on level {} (score {})", world.current_level, world.score);
    } else {
        world.player.respawn(world.level.def.spawn);
    }
}

// ══════════════════════════════════════════════════════════════
// Win conditions
// ══════════════════════════════════════════════════════════════

fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(goal) = world.level.goal else { return };
    if !overlaps(&world.player.rect(), &goal) { return; }

    let level = world.current_level;
    world.phase = Phase::LevelComplete;
    events.push(GameEvent::LevelCompleted { level });
    log::info!("level {level} complete after {} ticks (score {})", world.tick, world.score);

    if let (Some(total), Some(left)) = (world.level.def.countdown, world.time_left) {
        let seconds = f64::from(total - left);
        if world.best_times.record(level, seconds) {
            log::info!("new best time on level {level}: {seconds:.2}s");
            events.push(GameEvent::NewBestTime { level, seconds });
        }
    }
}

fn resolve_door(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(door) = world.level.def.door else { return };
    if !overlaps(&world.player.rect(), &door) { return; }
    if !world.level.all_collected() { return; }

    world.phase = Phase::AllClear;
    events.push(GameEvent::AllCleared);
    log::info!("all levels cleared (score {})", world.score);
}

fn resolve_reveal(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.level.goal.is_some() || !world.level.all_collected() { return; }
    let Some(at) = world.level.def.goal_reveal else { return };

    world.level.goal = Some(at);
    events.push(GameEvent::GoalRevealed { x: at.x, y: at.y });
}

fn resolve_countdown(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let Some(left) = world.time_left.as_mut() else { return };
    *left -= dt;
    if *left <= 0.0 {
        world.phase = Phase::GameOver;
        events.push(GameEvent::TimeUp);
        events.push(GameEvent::GameOver);
        log::info!("time up on level {}", world.current_level);
    }
}
