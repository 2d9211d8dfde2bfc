//! # Custos (Authorization & Credential Core)
//!
//! `custos` is the access-control core of the admin backend. It answers three
//! questions for every request: is the caller sending too many requests, are
//! their credentials valid, and are they allowed to do what they are asking
//! for.
//!
//! ## Authorization model
//!
//! Access is role-based: a principal holds roles, roles hold permissions, and
//! every check derives the effective permission set fresh from the directory
//! at evaluation time. There is no cached ACL, so role or permission changes
//! take effect on the next request.
//!
//! - **Superuser bypass:** a superuser principal passes every permission and
//!   role check before any directory lookup happens.
//! - **Active-only:** inactive roles and permissions are silently ignored,
//!   never treated as errors.
//! - **Forbidden vs unauthorized:** failed authorization names the unmet
//!   requirement (safe to disclose); failed authentication is always the
//!   uniform `Invalid credentials`, regardless of the internal cause.
//!
//! ## Credentials
//!
//! Stored credentials are opaque `$`-delimited PBKDF2-HMAC-SHA256 strings,
//! compatible with the legacy hashes already in the user table. Verification
//! recomputes the derived key and compares in constant time; malformed stored
//! hashes verify as `false` rather than erroring.
//!
//! ## Rate limiting
//!
//! A fixed-window counter per (client, path) pair guards every route. Expired
//! windows are evicted as new keys arrive, so the table stays bounded.

pub mod api;
pub mod auth;
pub mod cli;
pub mod ratelimit;
