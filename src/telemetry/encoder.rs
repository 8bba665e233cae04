//! # Telemetry Payload Encoder
//!
//! Renders a [`TelemetryReading`] as a compact JSON document. Field order is
//! fixed and every float carries exactly four fractional digits, so encoding
//! the same reading always yields the same bytes.
//!
//! Full document layout:
//!
//! ```text
//! {"orientation":{"x":..,"y":..,"z":..},"gyro":{..},"accel":{..},
//!  "linear_accel":{..},"gravity":{..},"mag":{..},"temp":N,
//!  "cal":{"sys":N,"gyro":N,"accel":N,"mag":N}}
//! ```
//!
//! The single-vector variant carries only the orientation:
//! `{"x":..,"y":..,"z":..}`.
//!
//! A non-finite component (NaN or infinity) is written as `null`.

use serde::Deserialize;
use std::fmt::Write;

use super::reading::{TelemetryReading, Vector3};

/// Payload variant emitted by a sensor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Orientation vector only, flat `x`/`y`/`z`
    #[default]
    Orientation,

    /// Every vector plus temperature and calibration
    Full,
}

/// Encode a reading in the requested format
///
/// # Examples
///
/// ```
/// use imu_relay::telemetry::encoder::{encode, PayloadFormat};
/// use imu_relay::telemetry::reading::{TelemetryReading, Vector3};
///
/// let reading = TelemetryReading {
///     orientation: Vector3::new(1.0, 2.0, 3.0),
///     ..Default::default()
/// };
/// assert_eq!(
///     encode(&reading, PayloadFormat::Orientation),
///     r#"{"x":1.0000,"y":2.0000,"z":3.0000}"#
/// );
/// ```
pub fn encode(reading: &TelemetryReading, format: PayloadFormat) -> String {
    match format {
        PayloadFormat::Orientation => encode_vector(&reading.orientation),
        PayloadFormat::Full => encode_full(reading),
    }
}

/// Encode a single vector as `{"x":..,"y":..,"z":..}`
pub fn encode_vector(v: &Vector3) -> String {
    let mut out = String::with_capacity(48);
    write_vector(&mut out, v);
    out
}

/// Encode the full nested document
pub fn encode_full(reading: &TelemetryReading) -> String {
    let mut out = String::with_capacity(384);

    out.push('{');
    for (i, (key, v)) in [
        ("orientation", &reading.orientation),
        ("gyro", &reading.gyro),
        ("accel", &reading.accel),
        ("linear_accel", &reading.linear_accel),
        ("gravity", &reading.gravity),
        ("mag", &reading.mag),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "\"{}\":", key);
        write_vector(&mut out, v);
    }

    let cal = &reading.cal;
    let _ = write!(
        out,
        ",\"temp\":{},\"cal\":{{\"sys\":{},\"gyro\":{},\"accel\":{},\"mag\":{}}}}}",
        reading.temp, cal.sys, cal.gyro, cal.accel, cal.mag
    );

    out
}

fn write_vector(out: &mut String, v: &Vector3) {
    out.push_str("{\"x\":");
    write_component(out, v.x);
    out.push_str(",\"y\":");
    write_component(out, v.y);
    out.push_str(",\"z\":");
    write_component(out, v.z);
    out.push('}');
}

/// NaN and infinities have no JSON number form and are written as `null`
fn write_component(out: &mut String, value: f32) {
    if value.is_finite() {
        // Writing to a String cannot fail
        let _ = write!(out, "{:.4}", value);
    } else {
        out.push_str("null");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::reading::CalibrationStatus;

    fn sample_reading() -> TelemetryReading {
        TelemetryReading {
            orientation: Vector3::new(1.23456, -0.5, 0.0),
            gyro: Vector3::new(0.01, -0.02, 0.03),
            accel: Vector3::new(0.1, 0.2, 9.81),
            linear_accel: Vector3::new(0.1, 0.2, 0.0),
            gravity: Vector3::new(0.0, 0.0, 9.81),
            mag: Vector3::new(-21.5, 4.25, -40.0),
            temp: 27,
            cal: CalibrationStatus {
                sys: 3,
                gyro: 3,
                accel: 1,
                mag: 2,
            },
        }
    }

    #[test]
    fn test_four_decimal_rounding() {
        let v = Vector3::new(1.23456, -0.5, 0.0);
        assert_eq!(encode_vector(&v), r#"{"x":1.2346,"y":-0.5000,"z":0.0000}"#);
    }

    #[test]
    fn test_non_finite_components_are_null() {
        let v = Vector3::new(f32::NAN, f32::INFINITY, f32::NEG_INFINITY);
        assert_eq!(encode_vector(&v), r#"{"x":null,"y":null,"z":null}"#);

        let reading = TelemetryReading {
            gyro: Vector3::new(0.5, f32::NAN, 0.0),
            ..sample_reading()
        };
        let value: serde_json::Value = serde_json::from_str(&encode_full(&reading)).unwrap();
        assert!(value["gyro"]["y"].is_null());
        assert_eq!(value["gyro"]["x"], 0.5);
    }

    #[test]
    fn test_encoding_is_stable() {
        let reading = sample_reading();
        let first = encode(&reading, PayloadFormat::Full);
        for _ in 0..10 {
            assert_eq!(encode(&reading, PayloadFormat::Full), first);
        }
    }

    #[test]
    fn test_orientation_variant() {
        let reading = sample_reading();
        assert_eq!(
            encode(&reading, PayloadFormat::Orientation),
            r#"{"x":1.2346,"y":-0.5000,"z":0.0000}"#
        );
    }

    #[test]
    fn test_full_document_layout() {
        let encoded = encode_full(&sample_reading());
        let expected = concat!(
            r#"{"orientation":{"x":1.2346,"y":-0.5000,"z":0.0000},"#,
            r#""gyro":{"x":0.0100,"y":-0.0200,"z":0.0300},"#,
            r#""accel":{"x":0.1000,"y":0.2000,"z":9.8100},"#,
            r#""linear_accel":{"x":0.1000,"y":0.2000,"z":0.0000},"#,
            r#""gravity":{"x":0.0000,"y":0.0000,"z":9.8100},"#,
            r#""mag":{"x":-21.5000,"y":4.2500,"z":-40.0000},"#,
            r#""temp":27,"cal":{"sys":3,"gyro":3,"accel":1,"mag":2}}"#,
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_full_document_is_valid_json() {
        let encoded = encode_full(&sample_reading());
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["temp"], 27);
        assert_eq!(value["cal"]["accel"], 1);
        assert!((value["mag"]["x"].as_f64().unwrap() - (-21.5)).abs() < 1e-9);

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["orientation", "gyro", "accel", "linear_accel", "gravity", "mag", "temp", "cal"] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
    }

    #[test]
    fn test_full_document_exceeds_length_field() {
        // Even an all-zero reading does not fit the one-byte length field
        let encoded = encode_full(&TelemetryReading::default());
        assert!(encoded.len() > crate::protocol::frame::MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_payload_format_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            payload: PayloadFormat,
        }

        let w: Wrapper = toml::from_str("payload = \"full\"").unwrap();
        assert_eq!(w.payload, PayloadFormat::Full);

        let w: Wrapper = toml::from_str("payload = \"orientation\"").unwrap();
        assert_eq!(w.payload, PayloadFormat::Orientation);

        assert!(toml::from_str::<Wrapper>("payload = \"csv\"").is_err());
        assert_eq!(PayloadFormat::default(), PayloadFormat::Orientation);
    }
}
