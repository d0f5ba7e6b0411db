// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Range filters for the session listing.
//!
//! Each query parameter that is present becomes one predicate; a session is
//! kept only if every predicate accepts it. Bounds are inclusive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::Session;
use crate::time_utils::parse_date_param;

/// One filter over a session.
pub type SessionPredicate = Box<dyn Fn(&Session) -> bool + Send + Sync>;

/// Query parameters accepted by the session listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionFilterQuery {
    /// Session length in ms
    pub min_elapsed_time: Option<f64>,
    pub max_elapsed_time: Option<f64>,
    /// meters
    pub min_total_dist: Option<f64>,
    pub max_total_dist: Option<f64>,
    pub min_stroke_count: Option<f64>,
    pub max_stroke_count: Option<f64>,
    pub min_avg_dist_per_stroke: Option<f64>,
    pub max_avg_dist_per_stroke: Option<f64>,
    pub min_avg_stroke_rate: Option<f64>,
    pub max_avg_stroke_rate: Option<f64>,
    pub min_avg_speed: Option<f64>,
    pub max_avg_speed: Option<f64>,
    #[serde(default, deserialize_with = "date_param")]
    pub min_start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "date_param")]
    pub max_start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "date_param")]
    pub min_end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "date_param")]
    pub max_end_time: Option<DateTime<Utc>>,
    pub min_start_gps_lat: Option<f64>,
    pub max_start_gps_lat: Option<f64>,
    pub min_start_gps_lon: Option<f64>,
    pub max_start_gps_lon: Option<f64>,
    /// Passed to NK: only sessions at or before this time
    #[serde(default, deserialize_with = "date_param")]
    pub before: Option<DateTime<Utc>>,
    /// Passed to NK: only sessions at or after this time
    #[serde(default, deserialize_with = "date_param")]
    pub after: Option<DateTime<Utc>>,
}

fn date_param<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_param(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

/// Push a predicate for each bound that is set.
fn push_range<T>(
    predicates: &mut Vec<SessionPredicate>,
    min: Option<T>,
    max: Option<T>,
    field: fn(&Session) -> T,
) where
    T: PartialOrd + Copy + Send + Sync + 'static,
{
    if let Some(min) = min {
        predicates.push(Box::new(move |s: &Session| field(s) >= min));
    }
    if let Some(max) = max {
        predicates.push(Box::new(move |s: &Session| field(s) <= max));
    }
}

impl SessionFilterQuery {
    /// Build the predicates for the parameters that were given.
    pub fn predicates(&self) -> Vec<SessionPredicate> {
        let mut predicates = Vec::new();
        let p = &mut predicates;

        push_range(p, self.min_elapsed_time, self.max_elapsed_time, |s| s.duration);
        push_range(p, self.min_total_dist, self.max_total_dist, |s| s.total_distance);
        push_range(p, self.min_stroke_count, self.max_stroke_count, |s| {
            s.stroke_count as f64
        });
        push_range(
            p,
            self.min_avg_dist_per_stroke,
            self.max_avg_dist_per_stroke,
            |s| s.avg_dist_per_stroke,
        );
        push_range(p, self.min_avg_stroke_rate, self.max_avg_stroke_rate, |s| {
            s.avg_stroke_rate
        });
        push_range(p, self.min_avg_speed, self.max_avg_speed, |s| s.avg_speed);
        push_range(p, self.min_start_time, self.max_start_time, |s| s.start_time);
        push_range(p, self.min_end_time, self.max_end_time, |s| s.end_time);
        push_range(p, self.min_start_gps_lat, self.max_start_gps_lat, |s| {
            s.start_gps_lat
        });
        push_range(p, self.min_start_gps_lon, self.max_start_gps_lon, |s| {
            s.start_gps_lon
        });

        predicates
    }
}

/// Keep the sessions every predicate accepts.
pub fn apply_filters(sessions: Vec<Session>, predicates: &[SessionPredicate]) -> Vec<Session> {
    sessions
        .into_iter()
        .filter(|session| predicates.iter().all(|p| p(session)))
        .collect()
}
