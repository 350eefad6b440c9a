//! Simulated robot configuration
//!
//! ```text
//! SimulationConfig
//! ├── start_x/y/theta_deg, speed_factor, random_seed, dt_ms
//! ├── SimRobotConfig     # body radius, wheel base, speed scale
//! ├── IrConfig           # response curve, range, noise
//! └── ArenaConfig        # walls and round obstacles
//! ```
//!
//! Every parameter has a default, so an empty `[simulation]` section gives a
//! 2 m × 2 m arena with three obstacles. Wheel speeds are in the same native
//! units the controller uses; `speed_scale` converts them to m/s.

use serde::Deserialize;

/// Top-level simulation settings
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Initial X position (meters)
    #[serde(default = "default_start_x")]
    pub start_x: f32,

    /// Initial Y position (meters)
    #[serde(default = "default_start_y")]
    pub start_y: f32,

    /// Initial heading (degrees, CCW from +X)
    #[serde(default)]
    pub start_theta_deg: f32,

    /// Wall-clock multiplier for drive durations (1.0 = real time, 0 = no blocking)
    #[serde(default)]
    pub speed_factor: f32,

    /// Random seed for IR noise (0 = random each run)
    #[serde(default)]
    pub random_seed: u64,

    /// Physics integration step (milliseconds)
    #[serde(default = "default_dt_ms")]
    pub dt_ms: u32,

    #[serde(default)]
    pub robot: SimRobotConfig,

    #[serde(default)]
    pub ir: IrConfig,

    #[serde(default)]
    pub arena: ArenaConfig,
}

fn default_start_x() -> f32 {
    0.5
}
fn default_start_y() -> f32 {
    1.0
}
fn default_dt_ms() -> u32 {
    20
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_x: default_start_x(),
            start_y: default_start_y(),
            start_theta_deg: 0.0,
            speed_factor: 0.0,
            random_seed: 0,
            dt_ms: default_dt_ms(),
            robot: SimRobotConfig::default(),
            ir: IrConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

/// Robot body and drive parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SimRobotConfig {
    /// Body radius used for collisions and sensor mounting (meters)
    #[serde(default = "default_robot_radius")]
    pub radius: f32,

    /// Distance between wheel centers (meters)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// m/s per native wheel-speed unit
    #[serde(default = "default_speed_scale")]
    pub speed_scale: f32,
}

fn default_robot_radius() -> f32 {
    0.06
}
fn default_wheel_base() -> f32 {
    0.1
}
fn default_speed_scale() -> f32 {
    0.002
}

impl Default for SimRobotConfig {
    fn default() -> Self {
        Self {
            radius: default_robot_radius(),
            wheel_base: default_wheel_base(),
            speed_scale: default_speed_scale(),
        }
    }
}

/// IR proximity sensor model
///
/// Reading = `gain / distance` for a hit within `max_range`, else 0, plus
/// Gaussian noise, clamped to `[0, saturation]`.
#[derive(Debug, Clone, Deserialize)]
pub struct IrConfig {
    #[serde(default = "default_ir_gain")]
    pub gain: f32,

    /// Beyond this distance a sensor reads 0 (meters)
    #[serde(default = "default_ir_max_range")]
    pub max_range: f32,

    /// Distances are floored here before inversion (meters)
    #[serde(default = "default_ir_min_distance")]
    pub min_distance: f32,

    /// Upper clamp for a reading
    #[serde(default = "default_ir_saturation")]
    pub saturation: f32,

    /// Reading noise standard deviation
    #[serde(default = "default_ir_noise_stddev")]
    pub noise_stddev: f32,
}

fn default_ir_gain() -> f32 {
    5.0
}
fn default_ir_max_range() -> f32 {
    1.0
}
fn default_ir_min_distance() -> f32 {
    0.002
}
fn default_ir_saturation() -> f32 {
    2500.0
}
fn default_ir_noise_stddev() -> f32 {
    0.2
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            gain: default_ir_gain(),
            max_range: default_ir_max_range(),
            min_distance: default_ir_min_distance(),
            saturation: default_ir_saturation(),
            noise_stddev: default_ir_noise_stddev(),
        }
    }
}

/// Rectangular arena with walls on all four sides
#[derive(Debug, Clone, Deserialize)]
pub struct ArenaConfig {
    /// Arena width along X (meters)
    #[serde(default = "default_arena_width")]
    pub width: f32,

    /// Arena height along Y (meters)
    #[serde(default = "default_arena_height")]
    pub height: f32,

    /// Round obstacles inside the arena
    #[serde(default = "default_obstacles")]
    pub obstacles: Vec<ObstacleConfig>,
}

/// Round obstacle
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ObstacleConfig {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

fn default_arena_width() -> f32 {
    2.0
}
fn default_arena_height() -> f32 {
    2.0
}
fn default_obstacles() -> Vec<ObstacleConfig> {
    vec![
        ObstacleConfig {
            x: 1.2,
            y: 1.0,
            radius: 0.1,
        },
        ObstacleConfig {
            x: 0.6,
            y: 0.4,
            radius: 0.08,
        },
        ObstacleConfig {
            x: 1.5,
            y: 1.6,
            radius: 0.12,
        },
    ]
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_arena_width(),
            height: default_arena_height(),
            obstacles: default_obstacles(),
        }
    }
}
