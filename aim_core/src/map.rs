use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Shrink by `margin` on every side. Returns None if nothing is left.
    pub fn inset(&self, margin: f32) -> Option<Self> {
        let min = self.min + Vec2::splat(margin);
        let max = self.max - Vec2::splat(margin);
        (min.x <= max.x && min.y <= max.y).then_some(Self { min, max })
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// The rectangle targets live in, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Region a circle of `radius` may be centered in without leaving the area
    pub fn spawn_region(&self, radius: f32) -> Option<Aabb> {
        self.bounds().inset(radius)
    }

    /// Check a circle lies fully inside the area
    pub fn contains_circle(&self, center: Vec2, radius: f32) -> bool {
        self.spawn_region(radius)
            .is_some_and(|region| region.contains(center))
    }

    /// Reflect a circle off the area walls.
    ///
    /// Overshoot past a wall is mirrored back inside and the matching velocity
    /// component flips, so motion stays continuous with no wrap-around.
    /// Returns true if any wall was hit.
    pub fn reflect(&self, pos: &mut Vec2, vel: &mut Vec2, radius: f32) -> bool {
        let mut bounced = false;
        let lo = Vec2::splat(radius);
        let hi = Vec2::new(self.width - radius, self.height - radius);

        for axis in 0..2 {
            if pos[axis] < lo[axis] {
                pos[axis] = 2.0 * lo[axis] - pos[axis];
                vel[axis] = vel[axis].abs();
                bounced = true;
            } else if pos[axis] > hi[axis] {
                pos[axis] = 2.0 * hi[axis] - pos[axis];
                vel[axis] = -vel[axis].abs();
                bounced = true;
            }
            // A huge overshoot can mirror past the opposite wall
            pos[axis] = pos[axis].clamp(lo[axis], hi[axis].max(lo[axis]));
        }

        bounced
    }

    /// Map a point to a cell of an `n` x `n` grid, clamping points on or past the edges
    pub fn cell_of(&self, point: Vec2, n: usize) -> usize {
        let cell = |v: f32, extent: f32| -> usize {
            let scaled = (v / extent * n as f32).floor();
            if scaled.is_nan() || scaled < 0.0 {
                0
            } else {
                (scaled as usize).min(n - 1)
            }
        };
        cell(point.y, self.height) * n + cell(point.x, self.width)
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        Self::new(crate::Params::PLAY_WIDTH, crate::Params::PLAY_HEIGHT)
    }
}
