/// Entities: Player, Enemy (patrolling bee), Collectible (strawberry), Particle.
/// All positions are top-left corners in playfield coordinates.

use super::rect::Rect;

pub const PLAYER_SIZE: f32 = 30.0;
pub const ENEMY_SIZE: f32 = 25.0;
pub const COLLECTIBLE_SIZE: f32 = 20.0;

/// Frame input: discrete held-key state, sampled once per tick.
/// Keyboard and gamepad both write into the same booleans.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player { x, y, vx: 0.0, vy: 0.0, on_ground: false }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }

    /// Put the player back at a spawn point, motionless.
    pub fn respawn(&mut self, spawn: (f32, f32)) {
        self.x = spawn.0;
        self.y = spawn.1;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ground = false;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub start_x: f32,
    pub end_x: f32,
}

impl Enemy {
    pub fn new(x: f32, y: f32, vx: f32, start_x: f32, end_x: f32) -> Self {
        Enemy { x, y, vx, start_x, end_x }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, ENEMY_SIZE, ENEMY_SIZE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub rect: Rect,
    pub collected: bool,
}

impl Collectible {
    pub fn new(rect: Rect) -> Self {
        Collectible { rect, collected: false }
    }
}

/// Pickup sparkle. Purely visual; never affects gameplay.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32, // 1.0 → 0.0
}

/// Life lost per tick.
pub const PARTICLE_FADE: f32 = 0.02;

impl Particle {
    /// Advance one tick. Returns true while the particle is still alive.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.life -= PARTICLE_FADE;
        self.life > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_clears_motion() {
        let mut p = Player::new(10.0, 20.0);
        p.vx = 300.0;
        p.vy = -120.0;
        p.on_ground = true;
        p.respawn((100.0, 500.0));
        assert_eq!(p, Player::new(100.0, 500.0));
    }

    #[test]
    fn player_rect_is_fixed_size() {
        let p = Player::new(5.0, 6.0);
        assert_eq!(p.rect(), Rect::new(5.0, 6.0, PLAYER_SIZE, PLAYER_SIZE));
    }

    #[test]
    fn particle_fades_out() {
        let mut p = Particle { x: 0.0, y: 0.0, vx: 60.0, vy: -60.0, life: 1.0 };
        assert!(p.tick(1.0 / 60.0));
        assert!((p.x - 1.0).abs() < 1e-4);
        assert!((p.y + 1.0).abs() < 1e-4);

        let mut ticks = 1;
        while p.tick(1.0 / 60.0) {
            ticks += 1;
        }
        // 1.0 / 0.02 = 50 ticks, give or take float rounding
        assert!((49..=51).contains(&(ticks + 1)));
    }
}
