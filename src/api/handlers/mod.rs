//! API route handlers.
//!
//! Handlers extract the shared [`ApiState`](super::ApiState) and database
//! pool via `Extension` and keep authorization decisions in the pure
//! `auth` modules; nothing here re-implements policy.

pub mod access;
pub mod health;
pub mod login;
pub mod password;
pub mod root;

/// Normalize a username for lookup and throttling keys.
pub(crate) fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_username_trims_and_lowercases() {
        assert_eq!(normalize_username("  Admin "), "admin");
    }
}
