/// Player and obstacle motion: fixed-step Euler integration plus AABB
/// resolution against static platforms.
///
/// Every function takes `dt` explicitly. The driver normally passes 1/60 s,
/// but nothing here assumes a particular rate. Friction is the exception:
/// it is a per-tick multiplier, not a per-second rate.
///
/// Platform resolution is sequential: each overlapping platform is resolved
/// on its own, in authoring order, and a later platform can override what an
/// earlier one decided in the same tick.

use crate::config::PhysicsConfig;
use super::entity::{Enemy, FrameInput, Player, PLAYER_SIZE};
use super::rect::{overlaps, Rect, PLAYFIELD_H, PLAYFIELD_W};

/// What happened to the player during one movement step.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Movement {
    pub jumped: bool,
    /// Fell below the bottom of the playfield.
    pub fell: bool,
}

/// Full player movement for one tick: input → gravity → integrate →
/// platforms → horizontal clamp → fall check.
pub fn move_player(
    player: &mut Player,
    input: FrameInput,
    platforms: &[Rect],
    cfg: &PhysicsConfig,
    dt: f32,
) -> Movement {
    let jumped = apply_input(player, input, cfg);
    integrate(player, cfg.gravity, dt);
    resolve_platforms(player, platforms);
    clamp_to_playfield(player);
    Movement { jumped, fell: fell_off(player) }
}

/// Horizontal steering and jump. Returns true if a jump started this tick.
pub fn apply_input(player: &mut Player, input: FrameInput, cfg: &PhysicsConfig) -> bool {
    if input.left {
        player.vx = -cfg.player_speed;
    } else if input.right {
        player.vx = cfg.player_speed;
    } else {
        player.vx *= cfg.friction;
    }

    if input.up && player.on_ground {
        player.vy = -cfg.jump_force;
        player.on_ground = false;
        return true;
    }
    false
}

pub fn integrate(player: &mut Player, gravity: f32, dt: f32) {
    player.vy += gravity * dt;
    player.x += player.vx * dt;
    player.y += player.vy * dt;
}

/// Push the player out of every platform it overlaps.
///
/// Axis choice per platform:
///   - falling with its top above the platform top  → land on it
///   - rising with its top below the platform top   → bump the underside
///   - otherwise, moving sideways                   → stop at the near edge
pub fn resolve_platforms(player: &mut Player, platforms: &[Rect]) {
    player.on_ground = false;
    for platform in platforms {
        if !overlaps(&player.rect(), platform) {
            continue;
        }
        if player.vy > 0.0 && player.y < platform.y {
            player.y = platform.y - PLAYER_SIZE;
            player.vy = 0.0;
            player.on_ground = true;
        } else if player.vy < 0.0 && player.y > platform.y {
            player.y = platform.bottom();
            player.vy = 0.0;
        } else if player.vx > 0.0 {
            player.x = platform.x - PLAYER_SIZE;
        } else if player.vx < 0.0 {
            player.x = platform.right();
        }
    }
}

pub fn clamp_to_playfield(player: &mut Player) {
    player.x = player.x.clamp(0.0, PLAYFIELD_W - PLAYER_SIZE);
}

#[inline]
pub fn fell_off(player: &Player) -> bool {
    player.y > PLAYFIELD_H
}

/// Advance a patrolling enemy. Direction flips once x reaches or passes a
/// bound; the position itself is not clamped.
pub fn patrol(enemy: &mut Enemy, dt: f32) {
    enemy.x += enemy.vx * dt;
    if enemy.x <= enemy.start_x || enemy.x >= enemy.end_x {
        enemy.vx = -enemy.vx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn ground() -> Rect {
        Rect::new(0.0, 650.0, 1280.0, 20.0)
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn standing_on(platform: &Rect, x: f32) -> Player {
        let mut p = Player::new(x, platform.y - PLAYER_SIZE);
        p.on_ground = true;
        p
    }

    #[test]
    fn left_and_right_set_full_speed() {
        let mut p = Player::new(100.0, 100.0);
        apply_input(&mut p, FrameInput { left: true, ..idle() }, &cfg());
        assert_eq!(p.vx, -300.0);
        apply_input(&mut p, FrameInput { right: true, ..idle() }, &cfg());
        assert_eq!(p.vx, 300.0);
    }

    #[test]
    fn left_wins_over_right() {
        let mut p = Player::new(100.0, 100.0);
        apply_input(&mut p, FrameInput { left: true, right: true, up: false }, &cfg());
        assert_eq!(p.vx, -300.0);
    }

    #[test]
    fn friction_decays_without_reaching_zero() {
        let mut p = Player::new(100.0, 100.0);
        p.vx = 300.0;
        let mut prev = p.vx.abs();
        for _ in 0..60 {
            apply_input(&mut p, idle(), &cfg());
            let now = p.vx.abs();
            assert!(now < prev, "vx must strictly decrease: {now} !< {prev}");
            assert!(now > 0.0);
            prev = now;
        }
    }

    #[test]
    fn jump_requires_ground() {
        let mut p = Player::new(100.0, 100.0);
        assert!(!apply_input(&mut p, FrameInput { up: true, ..idle() }, &cfg()));
        assert_eq!(p.vy, 0.0);

        p.on_ground = true;
        assert!(apply_input(&mut p, FrameInput { up: true, ..idle() }, &cfg()));
        assert_eq!(p.vy, -400.0);
        assert!(!p.on_ground);
    }

    #[test]
    fn gravity_only_accelerates_until_landing() {
        let platforms = [ground()];
        let mut p = Player::new(100.0, 300.0);
        let mut prev_vy = p.vy;
        let mut landed = false;
        for _ in 0..600 {
            move_player(&mut p, idle(), &platforms, &cfg(), DT);
            if p.on_ground {
                landed = true;
                break;
            }
            assert!(p.vy > prev_vy, "vy must increase in free fall");
            prev_vy = p.vy;
        }
        assert!(landed);
        assert_eq!(p.vy, 0.0);
        assert_eq!(p.y, 650.0 - PLAYER_SIZE);
    }

    #[test]
    fn landing_is_idempotent() {
        let platforms = [ground()];
        let mut p = standing_on(&platforms[0], 200.0);
        for _ in 0..120 {
            move_player(&mut p, idle(), &platforms, &cfg(), DT);
            assert_eq!(p.y, 650.0 - PLAYER_SIZE);
            assert_eq!(p.vy, 0.0);
            assert!(p.on_ground);
        }
    }

    #[test]
    fn head_bump_stops_upward_motion() {
        let ceiling = Rect::new(0.0, 100.0, 400.0, 20.0);
        let mut p = Player::new(50.0, 121.0);
        p.vy = -400.0;
        move_player(&mut p, idle(), &[ceiling], &cfg(), DT);
        assert_eq!(p.y, ceiling.bottom());
        assert_eq!(p.vy, 0.0);
        assert!(!p.on_ground);
    }

    #[test]
    fn walking_into_a_wall_stops_at_its_edge() {
        // A tall block the player cannot land on: top is above the player.
        let wall = Rect::new(200.0, 500.0, 40.0, 200.0);
        let mut p = Player::new(169.0, 550.0);
        apply_input(&mut p, FrameInput { right: true, ..idle() }, &cfg());
        p.x += p.vx * DT;
        resolve_platforms(&mut p, &[wall]);
        assert_eq!(p.x, wall.x - PLAYER_SIZE);

        let mut p = Player::new(wall.right() + 1.0, 550.0);
        apply_input(&mut p, FrameInput { left: true, ..idle() }, &cfg());
        p.x += p.vx * DT;
        resolve_platforms(&mut p, &[wall]);
        assert_eq!(p.x, wall.right());
    }

    #[test]
    fn later_platform_overrides_earlier_one() {
        // Two overlapping slabs; which one the player ends up standing on
        // depends only on authoring order.
        let upper = Rect::new(0.0, 600.0, 400.0, 20.0);
        let lower = Rect::new(0.0, 610.0, 400.0, 20.0);

        let mut a = Player::new(100.0, 585.0);
        a.vy = 100.0;
        resolve_platforms(&mut a, &[upper, lower]);
        assert_eq!(a.y, upper.y - PLAYER_SIZE);

        let mut b = Player::new(100.0, 585.0);
        b.vy = 100.0;
        resolve_platforms(&mut b, &[lower, upper]);
        // Snapped onto `lower` at 580, still inside `upper`, but with vy == 0
        // and vx == 0 no branch fires for it.
        assert_eq!(b.y, lower.y - PLAYER_SIZE);
        assert!(b.on_ground);
    }

    #[test]
    fn clamp_keeps_player_on_screen() {
        let mut p = Player::new(-50.0, 100.0);
        clamp_to_playfield(&mut p);
        assert_eq!(p.x, 0.0);
        p.x = 5000.0;
        clamp_to_playfield(&mut p);
        assert_eq!(p.x, PLAYFIELD_W - PLAYER_SIZE);
    }

    #[test]
    fn falling_past_bottom_is_reported() {
        let mut p = Player::new(100.0, 715.0);
        p.vy = 600.0;
        let m = move_player(&mut p, idle(), &[], &cfg(), DT);
        assert!(m.fell);
        assert!(!m.jumped);
    }

    #[test]
    fn enemy_reverses_at_bounds() {
        let mut e = Enemy::new(250.0, 520.0, 100.0, 250.0, 350.0);
        let mut reversed_at = None;
        for i in 0..200 {
            patrol(&mut e, DT);
            if e.vx < 0.0 {
                reversed_at = Some(i);
                break;
            }
        }
        assert!(reversed_at.is_some());
        assert!(e.x >= 350.0);
        // Overshoot is bounded by one tick of travel.
        assert!(e.x < 350.0 + 100.0 * DT + 1e-3);

        // And it comes back.
        patrol(&mut e, DT);
        assert!(e.x < 350.0);
    }

    #[test]
    fn enemy_stays_near_patrol_range() {
        let mut e = Enemy::new(600.0, 320.0, 100.0, 600.0, 700.0);
        for _ in 0..2000 {
            patrol(&mut e, DT);
            assert!(e.x > 600.0 - 2.0 && e.x < 700.0 + 2.0, "x={}", e.x);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn idle_vx_magnitude_strictly_decreases(vx in prop_oneof![-300.0f32..-1.0, 1.0f32..300.0]) {
                let mut p = Player::new(640.0, 100.0);
                p.vx = vx;
                for _ in 0..30 {
                    let before = p.vx.abs();
                    apply_input(&mut p, FrameInput::default(), &PhysicsConfig::default());
                    prop_assert!(p.vx.abs() < before);
                }
            }

            #[test]
            fn player_x_always_inside_playfield(
                moves in proptest::collection::vec(0u8..4, 10..120)
            ) {
                let platforms = [Rect::new(0.0, 650.0, 1280.0, 20.0)];
                let mut p = Player::new(100.0, 500.0);
                for m in moves {
                    let input = FrameInput { left: m == 1, right: m == 2, up: m == 3 };
                    move_player(&mut p, input, &platforms, &PhysicsConfig::default(), DT);
                    prop_assert!(p.x >= 0.0 && p.x <= PLAYFIELD_W - PLAYER_SIZE);
                }
            }
        }
    }
}
