// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire schemas for the NK Logbook API.
//!
//! These types are the validation boundary: a vendor payload that does not
//! match them is rejected when it is decoded, so code past the client can rely
//! on every field being present and every enum code being known.
//! Missing metrics are reported by NK as `0.0`, not omitted.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::time_utils::deserialize_epoch_millis;

/// Session kind as reported by NK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum NkSessionType {
    JustGo,
    SingleDistance,
    SingleTime,
    Intervals,
}

impl TryFrom<u8> for NkSessionType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::JustGo),
            1 => Ok(Self::SingleDistance),
            2 => Ok(Self::SingleTime),
            3 => Ok(Self::Intervals),
            other => Err(format!("unknown session type {}", other)),
        }
    }
}

/// Which sensor the session's speed and distance come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum NkSpeedInput {
    Gps,
    Impeller,
}

impl TryFrom<u8> for NkSpeedInput {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Gps),
            1 => Ok(Self::Impeller),
            other => Err(format!("unknown speed input {}", other)),
        }
    }
}

/// One session from `GET /sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkSession {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub session_type: NkSessionType,
    pub speed_input: NkSpeedInput,
    /// Start, sent as ms since epoch in the recording's local time
    #[serde(deserialize_with = "deserialize_epoch_millis")]
    pub start_time: DateTime<Utc>,
    /// End, sent as ms since epoch in the recording's local time
    #[serde(deserialize_with = "deserialize_epoch_millis")]
    pub end_time: DateTime<Utc>,
    /// Session length in ms
    pub elapsed_time: f64,
    pub total_distance_gps: f64,
    pub total_distance_imp: f64,
    pub avg_pace_gps: f64,
    pub avg_pace_imp: f64,
    pub avg_stroke_rate: f64,
    pub dist_stroke_gps: f64,
    pub dist_stroke_imp: f64,
    pub avg_speed_gps: f64,
    pub avg_speed_imp: f64,
    pub total_stroke_count: i64,
    pub start_gps_lat: f64,
    pub start_gps_lon: f64,
    #[serde(default)]
    pub avg_heart_rate: f64,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub avg_power: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device_id: Option<i64>,
    /// For non-interval sessions NK sends one entry mirroring the session.
    #[serde(default)]
    pub intervals: Vec<NkInterval>,
    /// Empty unless an EmPower oarlock was connected.
    #[serde(default)]
    pub oarlock_sessions: Vec<NkOarlockSession>,
}

/// Per-interval aggregate inside a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkInterval {
    pub id: i64,
    pub session_id: i64,
    /// 1-indexed
    pub interval_number: i64,
    #[serde(deserialize_with = "deserialize_epoch_millis")]
    pub start_time: DateTime<Utc>,
    pub elapsed_time: f64,
    pub total_distance_gps: f64,
    pub total_distance_imp: f64,
    pub avg_stroke_rate: f64,
    pub dist_stroke_gps: f64,
    pub dist_stroke_imp: f64,
    pub avg_speed_gps: f64,
    pub avg_speed_imp: f64,
    pub total_stroke_count: i64,
    pub start_gps_lat: f64,
    pub start_gps_lon: f64,
}

/// Oarlock settings recorded for a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkOarlockSession {
    pub id: i64,
    pub session_id: i64,
    pub boat_name: String,
    pub seat_number: i64,
    /// 0 for port, 1 for starboard
    pub port_starboard: u8,
    pub oar_length: f64,
    pub oar_inboard_length: f64,
}

/// One stroke record from `GET /sessions/strokes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkStroke {
    pub id: i64,
    /// Sent as ms since epoch
    #[serde(deserialize_with = "deserialize_epoch_millis")]
    pub timestamp: DateTime<Utc>,
    pub session_id: i64,
    pub session_interval_id: i64,
    /// Elapsed time since the start of the interval, ms
    pub elapsed_time: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_insta_speed: f64,
    pub impeller_insta_speed: f64,
    pub gps_total_distance: f64,
    pub impeller_total_distance: f64,
    pub gps_dist_stroke: f64,
    pub impeller_dist_stroke: f64,
    pub stroke_count: i64,
    pub stroke_rate: f64,
    #[serde(default)]
    pub heart_rate: Option<f64>,
}

/// Hardware kind as reported by NK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum NkDeviceKind {
    SpeedCoach,
    CoxBox,
    Oarlock,
    Impeller,
    HeartRateBelt,
    SeatDisplay,
    BoatLight,
}

impl NkDeviceKind {
    /// NK's numeric code for this kind.
    pub fn code(self) -> u8 {
        match self {
            Self::SpeedCoach => 1,
            Self::CoxBox => 2,
            Self::Oarlock => 3,
            Self::Impeller => 4,
            Self::HeartRateBelt => 5,
            Self::SeatDisplay => 6,
            Self::BoatLight => 7,
        }
    }
}

impl TryFrom<u8> for NkDeviceKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::SpeedCoach),
            2 => Ok(Self::CoxBox),
            3 => Ok(Self::Oarlock),
            4 => Ok(Self::Impeller),
            5 => Ok(Self::HeartRateBelt),
            6 => Ok(Self::SeatDisplay),
            7 => Ok(Self::BoatLight),
            other => Err(format!("unknown device type {}", other)),
        }
    }
}

/// One device from `GET /devices` or `GET /devices/:id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkDevice {
    /// Several IDs may share one serial number.
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NkDeviceKind,
    pub model: String,
    pub name: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub serial_number: i64,
    pub manufacturer_name: String,
    pub profile_version: String,
    // Oarlock-only settings; null for every other kind.
    #[serde(default)]
    pub inboard_length: Option<f64>,
    #[serde(default)]
    pub oar_length: Option<f64>,
    #[serde(default)]
    pub port_starboard: Option<u8>,
    #[serde(default)]
    pub seat_number: Option<i64>,
    /// Devices controlled by this one
    #[serde(default)]
    pub slave_devices: Vec<NkDevice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_codes() {
        for code in 1..=7u8 {
            let kind = NkDeviceKind::try_from(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(NkDeviceKind::try_from(0).is_err());
        assert!(NkDeviceKind::try_from(8).is_err());
    }

    #[test]
    fn test_device_rejects_unknown_kind() {
        let json = r#"{
            "id": 1, "type": 9, "model": "m", "name": "n",
            "firmwareVersion": "1", "hardwareVersion": "1", "serialNumber": 5,
            "manufacturerName": "NK", "profileVersion": "1"
        }"#;
        assert!(serde_json::from_str::<NkDevice>(json).is_err());
    }

    #[test]
    fn test_oarlock_fields_optional() {
        let json = r#"{
            "id": 1, "type": 3, "model": "EmPower", "name": "Bow",
            "firmwareVersion": "1", "hardwareVersion": "1", "serialNumber": 5,
            "manufacturerName": "NK", "profileVersion": "1",
            "inboardLength": 88.0, "oarLength": 288.0, "portStarboard": 1, "seatNumber": 8
        }"#;
        let device: NkDevice = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind, NkDeviceKind::Oarlock);
        assert_eq!(device.seat_number, Some(8));
        assert!(device.slave_devices.is_empty());
    }
}
