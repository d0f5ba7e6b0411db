// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod device;
pub mod nk;
pub mod session;

pub use account::{
    AccountResponse, AccountsResponse, CreateAccountRequest, Credential, UpdateAccountRequest,
};
pub use device::{Device, DeviceType, DevicesResponse};
pub use session::{Interval, Session, SessionsResponse, Stroke, StrokesResponse};
