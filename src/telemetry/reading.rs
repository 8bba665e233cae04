//! # Telemetry Reading Types
//!
//! One instantaneous sample from a 9-DOF orientation sensor.

/// Three-axis vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Sensor fusion calibration quality (0 = uncalibrated, 3 = fully calibrated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationStatus {
    pub sys: u8,
    pub gyro: u8,
    pub accel: u8,
    pub mag: u8,
}

impl CalibrationStatus {
    /// Highest calibration level reported by the sensor
    pub const MAX_LEVEL: u8 = 3;

    /// Whether every subsystem reports full calibration
    pub fn is_fully_calibrated(&self) -> bool {
        [self.sys, self.gyro, self.accel, self.mag]
            .iter()
            .all(|&level| level >= Self::MAX_LEVEL)
    }
}

/// Complete IMU sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryReading {
    /// Euler orientation in degrees
    pub orientation: Vector3,

    /// Angular velocity in rad/s
    pub gyro: Vector3,

    /// Raw acceleration in m/s²
    pub accel: Vector3,

    /// Acceleration with gravity removed, in m/s²
    pub linear_accel: Vector3,

    /// Gravity vector in m/s²
    pub gravity: Vector3,

    /// Magnetic field in µT
    pub mag: Vector3,

    /// Die temperature in °C
    pub temp: i8,

    pub cal: CalibrationStatus,
}
