//! # Sensor Collaborator
//!
//! Source of IMU readings for the transmit loop. Hardware drivers implement
//! [`SensorSource`]; [`SimulatedImu`] stands in when no sensor is attached.

use crate::error::Result;
use crate::telemetry::reading::{CalibrationStatus, TelemetryReading, Vector3};

/// Standard gravity in m/s²
const STANDARD_GRAVITY: f32 = 9.806_65;

/// Synchronous, on-demand sensor access
#[cfg_attr(test, mockall::automock)]
pub trait SensorSource {
    /// Read one complete instantaneous sample, including calibration status
    fn read_reading(&mut self) -> Result<TelemetryReading>;
}

/// Deterministic sensor that slowly yaws while rocking in pitch and roll
#[derive(Debug, Clone, Default)]
pub struct SimulatedImu {
    sample: u64,
}

impl SimulatedImu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SensorSource for SimulatedImu {
    fn read_reading(&mut self) -> Result<TelemetryReading> {
        let t = self.sample as f32;
        self.sample += 1;

        let heading = (t * 6.0) % 360.0;
        let roll = 10.0 * (t * 0.1).sin();
        let pitch = 5.0 * (t * 0.1).cos();

        let (sin_r, cos_r) = roll.to_radians().sin_cos();
        let (sin_p, cos_p) = pitch.to_radians().sin_cos();
        let gravity = Vector3::new(
            -STANDARD_GRAVITY * sin_p,
            STANDARD_GRAVITY * sin_r * cos_p,
            STANDARD_GRAVITY * cos_r * cos_p,
        );
        let linear_accel = Vector3::new(0.01 * (t * 0.7).sin(), 0.0, 0.0);

        Ok(TelemetryReading {
            orientation: Vector3::new(heading, roll, pitch),
            gyro: Vector3::new(0.0, 0.0, 6.0_f32.to_radians()),
            accel: Vector3::new(
                gravity.x + linear_accel.x,
                gravity.y + linear_accel.y,
                gravity.z + linear_accel.z,
            ),
            linear_accel,
            gravity,
            mag: Vector3::new(
                22.0 * heading.to_radians().cos(),
                -22.0 * heading.to_radians().sin(),
                -40.0,
            ),
            temp: 24,
            cal: CalibrationStatus {
                sys: 3,
                gyro: 3,
                accel: 3,
                mag: 3,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_first_sample() {
        let mut imu = SimulatedImu::new();
        let reading = imu.read_reading().unwrap();

        assert_eq!(reading.orientation.x, 0.0);
        assert!(reading.cal.is_fully_calibrated());
        assert!((reading.gravity.z - STANDARD_GRAVITY).abs() < 0.1);
    }

    #[test]
    fn test_simulated_heading_advances_and_wraps() {
        let mut imu = SimulatedImu::new();
        let headings: Vec<f32> = (0..61)
            .map(|_| imu.read_reading().unwrap().orientation.x)
            .collect();

        assert_eq!(headings[1], 6.0);
        assert!(headings.iter().all(|h| (0.0..360.0).contains(h)));
        assert!(headings[60].abs() < 0.01);
    }

    #[test]
    fn test_simulated_is_deterministic() {
        let mut a = SimulatedImu::new();
        let mut b = SimulatedImu::new();
        for _ in 0..5 {
            assert_eq!(a.read_reading().unwrap(), b.read_reading().unwrap());
        }
    }
}
