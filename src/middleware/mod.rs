// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (rate limiting, security headers, error details).

pub mod error_details;
pub mod rate_limit;
pub mod security;

pub use error_details::expose_error_details;
pub use rate_limit::{rate_limit, RateLimiter};
pub use security::add_security_headers;
