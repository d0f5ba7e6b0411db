// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session, interval and stroke shapes returned by the data API.

use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::nk::{NkInterval, NkSession, NkSessionType, NkSpeedInput, NkStroke};

/// One rowing session with aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Session {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub description: String,
    pub location_description: Option<String>,
    /// meters
    pub total_distance: f64,
    /// meters/stroke
    pub avg_dist_per_stroke: f64,
    /// strokes/minute
    pub avg_stroke_rate: f64,
    /// meters/second
    pub avg_speed: f64,
    /// Local session time rendered as if it were UTC
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_time: DateTime<Utc>,
    /// ms
    pub duration: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub stroke_count: i64,
    pub start_gps_lat: f64,
    pub start_gps_lon: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub device_id: Option<i64>,
    /// Only populated for interval sessions.
    pub intervals: Vec<Interval>,
}

/// Aggregates for one interval of an interval session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Interval {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub distance: f64,
    pub avg_dist_per_stroke: f64,
    pub avg_stroke_rate: f64,
    pub avg_speed: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    pub duration: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub stroke_count: i64,
    pub start_gps_lat: f64,
    pub start_gps_lon: f64,
}

/// One stroke sample within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Stroke {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// meters/second
    pub speed: f64,
    pub total_distance: f64,
    pub elapsed_time: f64,
    pub dist_per_stroke: f64,
    pub stroke_rate: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub stroke_count: i64,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StrokesResponse {
    pub strokes: Vec<Stroke>,
}

/// Pick the GPS or impeller reading according to the session's speed input.
fn by_input(input: NkSpeedInput, gps: f64, impeller: f64) -> f64 {
    match input {
        NkSpeedInput::Gps => gps,
        NkSpeedInput::Impeller => impeller,
    }
}

impl Session {
    pub fn from_nk(nk: &NkSession) -> Self {
        let input = nk.speed_input;
        let intervals = if nk.session_type == NkSessionType::Intervals {
            nk.intervals
                .iter()
                .map(|i| Interval::from_nk(i, input))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            id: nk.id,
            description: nk.name.clone(),
            location_description: nk.location.clone().filter(|l| !l.trim().is_empty()),
            total_distance: by_input(input, nk.total_distance_gps, nk.total_distance_imp),
            avg_dist_per_stroke: by_input(input, nk.dist_stroke_gps, nk.dist_stroke_imp),
            avg_stroke_rate: nk.avg_stroke_rate,
            avg_speed: by_input(input, nk.avg_speed_gps, nk.avg_speed_imp),
            start_time: nk.start_time,
            end_time: nk.end_time,
            duration: nk.elapsed_time,
            stroke_count: nk.total_stroke_count,
            start_gps_lat: nk.start_gps_lat,
            start_gps_lon: nk.start_gps_lon,
            device_id: nk.device_id.filter(|&id| id != 0),
            intervals,
        }
    }
}

impl Interval {
    fn from_nk(nk: &NkInterval, input: NkSpeedInput) -> Self {
        Self {
            id: nk.id,
            distance: by_input(input, nk.total_distance_gps, nk.total_distance_imp),
            avg_dist_per_stroke: by_input(input, nk.dist_stroke_gps, nk.dist_stroke_imp),
            avg_stroke_rate: nk.avg_stroke_rate,
            avg_speed: by_input(input, nk.avg_speed_gps, nk.avg_speed_imp),
            start_time: nk.start_time,
            duration: nk.elapsed_time,
            stroke_count: nk.total_stroke_count,
            start_gps_lat: nk.start_gps_lat,
            start_gps_lon: nk.start_gps_lon,
        }
    }
}

impl Stroke {
    /// Map a vendor stroke, reading speed and distance from `input`.
    pub fn from_nk(nk: &NkStroke, input: NkSpeedInput) -> Self {
        Self {
            id: nk.id,
            timestamp: nk.timestamp,
            latitude: nk.latitude,
            longitude: nk.longitude,
            speed: by_input(input, nk.gps_insta_speed, nk.impeller_insta_speed),
            total_distance: by_input(input, nk.gps_total_distance, nk.impeller_total_distance),
            elapsed_time: nk.elapsed_time,
            dist_per_stroke: by_input(input, nk.gps_dist_stroke, nk.impeller_dist_stroke),
            stroke_rate: nk.stroke_rate,
            stroke_count: nk.stroke_count,
        }
    }
}
