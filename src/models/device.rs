// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device shape returned by the data API.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;
use crate::models::nk::{NkDevice, NkDeviceKind};

/// Head units the dashboard knows how to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DeviceType {
    SpeedCoach,
    CoxBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Device {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub model: String,
    pub name: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub serial_number: String,
    pub manufacturer_name: String,
    pub profile_version: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

impl TryFrom<&NkDevice> for Device {
    type Error = AppError;

    /// Only speed coaches and cox boxes map; any other kind is a server error.
    fn try_from(nk: &NkDevice) -> Result<Self, Self::Error> {
        let device_type = match nk.kind {
            NkDeviceKind::SpeedCoach => DeviceType::SpeedCoach,
            NkDeviceKind::CoxBox => DeviceType::CoxBox,
            other => {
                return Err(AppError::NkApi(format!(
                    "Unsupported device type {} for device {}",
                    other.code(),
                    nk.id
                )))
            }
        };

        Ok(Self {
            id: nk.id,
            device_type,
            model: nk.model.clone(),
            name: nk.name.clone(),
            firmware_version: nk.firmware_version.clone(),
            hardware_version: nk.hardware_version.clone(),
            serial_number: nk.serial_number.to_string(),
            manufacturer_name: nk.manufacturer_name.clone(),
            profile_version: nk.profile_version.clone(),
        })
    }
}
