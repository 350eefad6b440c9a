//! Arena geometry: wall segments and round obstacles.
//!
//! All queries are analytic, so ray casts are exact regardless of range.

use super::config::ArenaConfig;
use crate::error::{Result, VighnaError};

/// Line segment from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub ax: f32,
    pub ay: f32,
    pub bx: f32,
    pub by: f32,
}

/// Filled circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Simulation environment
#[derive(Debug, Clone)]
pub struct Arena {
    width: f32,
    height: f32,
    walls: Vec<Segment>,
    obstacles: Vec<Circle>,
}

impl Arena {
    /// Build a walled rectangle `[0, width] × [0, height]` with obstacles.
    pub fn from_config(config: &ArenaConfig) -> Result<Self> {
        if !(config.width > 0.0 && config.height > 0.0) {
            return Err(VighnaError::Config(format!(
                "arena must have positive size, got {} x {}",
                config.width, config.height
            )));
        }
        let (w, h) = (config.width, config.height);
        let walls = vec![
            Segment {
                ax: 0.0,
                ay: 0.0,
                bx: w,
                by: 0.0,
            },
            Segment {
                ax: w,
                ay: 0.0,
                bx: w,
                by: h,
            },
            Segment {
                ax: w,
                ay: h,
                bx: 0.0,
                by: h,
            },
            Segment {
                ax: 0.0,
                ay: h,
                bx: 0.0,
                by: 0.0,
            },
        ];

        let mut obstacles = Vec::with_capacity(config.obstacles.len());
        for o in &config.obstacles {
            if !(o.radius > 0.0) {
                return Err(VighnaError::Config(format!(
                    "obstacle at ({}, {}) has non-positive radius {}",
                    o.x, o.y, o.radius
                )));
            }
            obstacles.push(Circle {
                x: o.x,
                y: o.y,
                radius: o.radius,
            });
        }

        Ok(Self {
            width: w,
            height: h,
            walls,
            obstacles,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn obstacles(&self) -> &[Circle] {
        &self.obstacles
    }

    /// Distance along the ray to the nearest surface, or `max_range` if none.
    pub fn ray_cast(&self, ox: f32, oy: f32, angle: f32, max_range: f32) -> f32 {
        let (dx, dy) = (angle.cos(), angle.sin());
        let walls = self
            .walls
            .iter()
            .filter_map(|s| ray_segment(ox, oy, dx, dy, s));
        let circles = self
            .obstacles
            .iter()
            .filter_map(|c| ray_circle(ox, oy, dx, dy, c));
        walls.chain(circles).fold(max_range, f32::min)
    }

    /// True if a disc of `radius` centered at (x, y) overlaps any surface
    /// or lies outside the walls.
    pub fn collides(&self, x: f32, y: f32, radius: f32) -> bool {
        if x < radius || y < radius || x > self.width - radius || y > self.height - radius {
            return true;
        }
        self.obstacles.iter().any(|c| {
            let (ddx, ddy) = (x - c.x, y - c.y);
            ddx * ddx + ddy * ddy < (c.radius + radius) * (c.radius + radius)
        })
    }
}

#[inline]
fn cross(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ax * by - ay * bx
}

/// Ray parameter `t >= 0` where the unit ray hits the segment.
fn ray_segment(ox: f32, oy: f32, dx: f32, dy: f32, s: &Segment) -> Option<f32> {
    let (ex, ey) = (s.bx - s.ax, s.by - s.ay);
    let denom = cross(dx, dy, ex, ey);
    if denom.abs() < 1e-9 {
        return None;
    }
    let (px, py) = (s.ax - ox, s.ay - oy);
    let t = cross(px, py, ex, ey) / denom;
    let u = cross(px, py, dx, dy) / denom;
    (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Ray parameter of the first hit on the circle. 0 if the origin is inside.
fn ray_circle(ox: f32, oy: f32, dx: f32, dy: f32, c: &Circle) -> Option<f32> {
    let (fx, fy) = (ox - c.x, oy - c.y);
    let k = fx * fx + fy * fy - c.radius * c.radius;
    if k <= 0.0 {
        return Some(0.0);
    }
    let b = fx * dx + fy * dy;
    let disc = b * b - k;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}
