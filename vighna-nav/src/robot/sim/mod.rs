//! Simulated robot.
//!
//! A differential-drive body in a walled arena with round obstacles. Drive
//! commands are integrated in fixed `dt_ms` steps; contact stops translation
//! but not rotation. Frames come from eight ray-cast IR sensors with seeded
//! Gaussian noise.
//!
//! Time is simulated: the robot keeps its own clock, advanced by each drive
//! command. With `speed_factor > 0` a drive call also sleeps for the scaled
//! duration so the run can be watched in real time.
//!
//! - [`config`]: all simulation parameters
//! - [`arena`]: wall and obstacle geometry
//! - [`physics`]: kinematics and collision
//! - [`ir`]: sensor model and noise

pub mod arena;
pub mod config;
pub mod ir;
pub mod physics;

pub use arena::Arena;
pub use config::SimulationConfig;
pub use physics::Pose;

use std::time::Duration;

use super::{DriveCommand, Robot};
use crate::error::{Result, VighnaError};
use crate::sensors::SensorFrame;
use ir::IrArray;
use physics::PhysicsState;

/// Largest accepted `speed_factor`
pub const MAX_SPEED_FACTOR: f32 = 100.0;

/// Robot simulated in-process
pub struct SimulatedRobot {
    config: SimulationConfig,
    arena: Arena,
    physics: PhysicsState,
    ir: IrArray,
    clock_us: u64,
    running: bool,
    trajectory: Vec<Pose>,
}

impl SimulatedRobot {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.dt_ms == 0 {
            return Err(VighnaError::Config("simulation dt_ms must be positive".into()));
        }
        if !(0.0..=MAX_SPEED_FACTOR).contains(&config.speed_factor) {
            return Err(VighnaError::Config(format!(
                "speed_factor must be within 0..={}, got {}",
                MAX_SPEED_FACTOR, config.speed_factor
            )));
        }
        let arena = Arena::from_config(&config.arena)?;
        let physics = initial_physics(&config);
        let start = physics.pose();
        if arena.collides(start.x, start.y, physics.radius()) {
            return Err(VighnaError::Config(format!(
                "start position ({}, {}) overlaps the arena walls or an obstacle",
                start.x, start.y
            )));
        }
        let ir = IrArray::new(&config.ir, config.random_seed);

        Ok(Self {
            config,
            arena,
            physics,
            ir,
            clock_us: 0,
            running: false,
            trajectory: vec![start],
        })
    }

    pub fn pose(&self) -> Pose {
        self.physics.pose()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Integration steps that ended in contact since the last start
    pub fn collisions(&self) -> u32 {
        self.physics.collisions()
    }

    /// Pose after every drive command since the last start
    pub fn trajectory(&self) -> &[Pose] {
        &self.trajectory
    }

    /// Simulated time in microseconds
    pub fn clock_us(&self) -> u64 {
        self.clock_us
    }

    fn advance(&mut self, command: DriveCommand) {
        let scale = self.config.robot.speed_scale;
        let left_vel = command.left as f32 * scale;
        let right_vel = command.right as f32 * scale;

        let mut remaining_ms = command.duration_ms;
        while remaining_ms > 0 {
            let step_ms = remaining_ms.min(self.config.dt_ms);
            let dt = step_ms as f32 / 1000.0;
            self.physics.update(dt, left_vel, right_vel, &self.arena);
            remaining_ms -= step_ms;
        }
        self.clock_us += u64::from(command.duration_ms) * 1000;
        self.trajectory.push(self.physics.pose());
    }
}

fn initial_physics(config: &SimulationConfig) -> PhysicsState {
    PhysicsState::new(
        config.start_x,
        config.start_y,
        config.start_theta_deg.to_radians(),
        config.robot.radius,
        config.robot.wheel_base,
    )
}

impl Robot for SimulatedRobot {
    /// Reset the body to the start pose and start the clock.
    fn start(&mut self) -> Result<()> {
        self.physics = initial_physics(&self.config);
        self.clock_us = 0;
        self.trajectory = vec![self.physics.pose()];
        self.running = true;
        tracing::info!(
            "Simulation started at ({:.2}, {:.2}), {} obstacles",
            self.config.start_x,
            self.config.start_y,
            self.arena.obstacles().len()
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.running {
            tracing::info!(
                "Simulation stopped after {:.1}s simulated, {} collision steps",
                self.clock_us as f64 / 1e6,
                self.physics.collisions()
            );
        }
        self.running = false;
        Ok(())
    }

    fn acquire_frame(&mut self) -> Result<SensorFrame> {
        if !self.running {
            return Err(VighnaError::SensorRead("simulation is not running".into()));
        }
        let values = self
            .ir
            .read(&self.arena, self.physics.pose(), self.physics.radius());
        SensorFrame::new(self.clock_us, values)
    }

    fn drive(&mut self, command: DriveCommand) {
        if !self.running {
            tracing::warn!("Drive command ignored: simulation is not running");
            return;
        }
        self.advance(command);
        if self.config.speed_factor > 0.0 && command.duration_ms > 0 {
            let wall_ms = f64::from(command.duration_ms) * f64::from(self.config.speed_factor);
            std::thread::sleep(Duration::from_secs_f64(wall_ms / 1000.0));
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
