/// Axis-aligned rectangles in playfield coordinates.
///
/// The playfield is a fixed 1280×720 space with y growing downward.
/// Every collision test in the game goes through `overlaps()`.

pub const PLAYFIELD_W: f32 = 1280.0;
pub const PLAYFIELD_H: f32 = 720.0;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Half-open AABB intersection. Rectangles that only touch along an edge
/// do not overlap. A zero-size rectangle strictly inside another overlaps
/// it; two zero-size rectangles never overlap each other.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}
