//! Ray-cast IR proximity sensors.
//!
//! Each channel sits on the body rim at a mounting angle and looks out
//! along a facing angle (both relative to the heading). The two outer front
//! sensors sit off-center but look nearly straight ahead, which is what lets
//! the classifier tell a left-hand obstacle from a right-hand one.
//!
//! Readings carry zero-mean Gaussian noise scaled by `noise_stddev`. A seed
//! of 0 draws the noise from entropy; any other seed replays exactly.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::arena::Arena;
use super::config::IrConfig;
use super::physics::Pose;
use crate::sensors::{CHANNEL_COUNT, Channel};

/// (mount angle, facing angle) in degrees, robot frame.
fn mount(channel: Channel) -> (f32, f32) {
    match channel {
        Channel::BackLeft => (150.0, 150.0),
        Channel::BackRight => (-150.0, -150.0),
        Channel::FrontLeft45 => (45.0, 45.0),
        Channel::FrontRight45 => (-45.0, -45.0),
        Channel::FrontCenter => (0.0, 0.0),
        Channel::FrontRightRight => (-25.0, -10.0),
        Channel::BackCenter => (180.0, 180.0),
        Channel::FrontLeftLeft => (25.0, 10.0),
    }
}

/// IR sensor array model
#[derive(Debug, Clone)]
pub struct IrArray {
    config: IrConfig,
    rng: SmallRng,
}

impl IrArray {
    pub fn new(config: &IrConfig, seed: u64) -> Self {
        let rng = match seed {
            0 => SmallRng::from_entropy(),
            s => SmallRng::seed_from_u64(s),
        };
        Self {
            config: config.clone(),
            rng,
        }
    }

    /// Reading for a surface at `distance` before noise.
    pub fn response(&self, distance: f32) -> f32 {
        if distance >= self.config.max_range {
            return 0.0;
        }
        let d = distance.max(self.config.min_distance);
        (self.config.gain / d).min(self.config.saturation)
    }

    /// Read all channels from a body of `radius` at `pose`.
    pub fn read(&mut self, arena: &Arena, pose: Pose, radius: f32) -> [f32; CHANNEL_COUNT] {
        let mut values = [0.0; CHANNEL_COUNT];
        for channel in Channel::ALL {
            let (mount_deg, facing_deg) = mount(channel);
            let mount_angle = pose.theta + mount_deg.to_radians();
            let sx = pose.x + radius * mount_angle.cos();
            let sy = pose.y + radius * mount_angle.sin();

            let distance = arena.ray_cast(
                sx,
                sy,
                pose.theta + facing_deg.to_radians(),
                self.config.max_range,
            );
            let value = self.response(distance) + self.jitter();
            values[channel.index()] = value.clamp(0.0, self.config.saturation);
        }
        values
    }

    fn jitter(&mut self) -> f32 {
        let stddev = self.config.noise_stddev;
        if stddev == 0.0 {
            return 0.0;
        }
        stddev * self.rng.sample::<f32, _>(StandardNormal)
    }
}
