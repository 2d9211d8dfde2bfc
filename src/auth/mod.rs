//! Authentication and authorization primitives.
//!
//! Everything in this module is independent of the HTTP layer and the
//! database: [`policy`] and [`credential`] work on plain strings, and
//! [`evaluator`] runs against an [`principal::AccessDirectory`] snapshot
//! supplied by the caller. The storage adapter in `api::storage` is the only
//! place that knows where that snapshot comes from.

pub mod credential;
pub mod evaluator;
pub mod policy;
pub mod principal;

/// Why an access check did not pass.
///
/// `Unauthorized` is deliberately cause-free: credential mismatch, unknown
/// user and malformed stored hash all collapse into it so callers cannot
/// distinguish them. `Forbidden` names only the requirement that was unmet,
/// never the principal's actual grants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Requires {requirement}")]
    Forbidden { requirement: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_message_is_uniform() {
        assert_eq!(AccessError::Unauthorized.to_string(), "Invalid credentials");
    }

    #[test]
    fn forbidden_names_the_requirement() {
        let err = AccessError::Forbidden {
            requirement: "permission quotes.view".to_string(),
        };
        assert_eq!(err.to_string(), "Requires permission quotes.view");
    }
}
