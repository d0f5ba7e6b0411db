// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod handshake;
pub mod nk_api;
pub mod nk_oauth;
pub mod session_filter;
pub mod token_resolver;

pub use handshake::{KeyValueStorage, MemoryStorage, RedirectHandshake};
pub use nk_api::NkApiClient;
pub use nk_oauth::{NkOAuthClient, TokenExchange, TokenGrant};
pub use session_filter::{apply_filters, SessionFilterQuery};
pub use token_resolver::AccessTokenResolver;
