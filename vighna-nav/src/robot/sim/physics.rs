//! Differential-drive kinematics with stop-on-collision.

use super::arena::Arena;
use std::f32::consts::{PI, TAU};

/// Pose of the simulated robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// X position in world frame (meters)
    pub x: f32,
    /// Y position in world frame (meters)
    pub y: f32,
    /// Orientation (radians, CCW from +X)
    pub theta: f32,
}

/// Physics state for the simulated robot
#[derive(Debug, Clone)]
pub struct PhysicsState {
    pose: Pose,
    radius: f32,
    wheel_base: f32,
    collisions: u32,
}

impl PhysicsState {
    pub fn new(x: f32, y: f32, theta: f32, radius: f32, wheel_base: f32) -> Self {
        Self {
            pose: Pose {
                x,
                y,
                theta: normalize_angle(theta),
            },
            radius,
            wheel_base,
            collisions: 0,
        }
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Integration steps that ended in contact
    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    /// Advance by `dt` seconds with the given wheel velocities (m/s).
    ///
    /// Returns true if the move was blocked. A blocked move still rotates.
    pub fn update(&mut self, dt: f32, left_vel: f32, right_vel: f32, arena: &Arena) -> bool {
        let linear_vel = (left_vel + right_vel) / 2.0;
        let angular_vel = (right_vel - left_vel) / self.wheel_base;
        let Pose { x, y, theta } = self.pose;

        let (new_x, new_y, new_theta) = if angular_vel.abs() < 1e-6 {
            // Straight line motion
            (
                x + linear_vel * theta.cos() * dt,
                y + linear_vel * theta.sin() * dt,
                theta,
            )
        } else {
            // Arc motion
            let r = linear_vel / angular_vel;
            let new_theta = theta + angular_vel * dt;
            (
                x + r * (new_theta.sin() - theta.sin()),
                y + r * (theta.cos() - new_theta.cos()),
                new_theta,
            )
        };

        self.pose.theta = normalize_angle(new_theta);
        if arena.collides(new_x, new_y, self.radius) {
            self.collisions += 1;
            return true;
        }
        self.pose.x = new_x;
        self.pose.y = new_y;
        false
    }
}

/// Normalize angle to [-π, π)
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a >= PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}
