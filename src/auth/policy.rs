//! Password composition policy and strength scoring.
//!
//! Pure functions, no state: `validate` collects every violated rule instead
//! of stopping at the first one, so the caller can show the full list in a
//! form. `score`/`strength_label` drive the strength meter in the admin UI.

/// Characters counted as "special" by both the validator and the scorer.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{}|;:,.<>?";

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Password must be at least {MIN_LENGTH} characters long")]
    TooShort,
    #[error("Password must be at most {MAX_LENGTH} characters long")]
    TooLong,
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one digit")]
    MissingDigit,
    #[error("Password must contain at least one special character")]
    MissingSpecial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl StrengthLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very_strong",
        }
    }
}

fn has_uppercase(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_uppercase())
}

fn has_lowercase(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
}

fn has_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit())
}

fn has_special(password: &str) -> bool {
    password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

/// Check the password against every composition rule.
///
/// # Errors
/// Returns the ordered list of violated rules; an empty error list is never
/// returned (a compliant password yields `Ok(())`).
pub fn validate(password: &str) -> Result<(), Vec<PolicyViolation>> {
    let mut violations = Vec::new();
    let length = password.chars().count();

    if length < MIN_LENGTH {
        violations.push(PolicyViolation::TooShort);
    }
    if length > MAX_LENGTH {
        violations.push(PolicyViolation::TooLong);
    }
    if !has_uppercase(password) {
        violations.push(PolicyViolation::MissingUppercase);
    }
    if !has_lowercase(password) {
        violations.push(PolicyViolation::MissingLowercase);
    }
    if !has_digit(password) {
        violations.push(PolicyViolation::MissingDigit);
    }
    if !has_special(password) {
        violations.push(PolicyViolation::MissingSpecial);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Score the password from 0 to 100.
///
/// Length contributes up to 30 points in buckets, character composition up
/// to 70 (with a bonus for mixing at least three classes). Both components
/// are capped, so the total never exceeds 100.
#[must_use]
pub fn score(password: &str) -> u8 {
    let length = password.chars().count();
    let length_score: u8 = if length < 8 {
        0
    } else if length < 12 {
        10
    } else if length < 16 {
        20
    } else {
        30
    };

    let mut complexity: u8 = 0;
    let mut classes: u8 = 0;
    if has_lowercase(password) {
        complexity += 10;
        classes += 1;
    }
    if has_uppercase(password) {
        complexity += 15;
        classes += 1;
    }
    if has_digit(password) {
        complexity += 15;
        classes += 1;
    }
    if has_special(password) {
        complexity += 20;
        classes += 1;
    }
    if classes >= 3 {
        complexity += 10;
    }

    (length_score + complexity.min(70)).min(100)
}

#[must_use]
pub const fn strength_label(score: u8) -> StrengthLabel {
    if score < 30 {
        StrengthLabel::Weak
    } else if score < 60 {
        StrengthLabel::Medium
    } else if score < 80 {
        StrengthLabel::Strong
    } else {
        StrengthLabel::VeryStrong
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_report_length_violation() {
        for password in ["", "a", "Ab1!", "Abcd12!"] {
            let violations = validate(password).expect_err("short password must fail");
            assert!(
                violations.contains(&PolicyViolation::TooShort),
                "missing TooShort for {password:?}"
            );
        }
    }

    #[test]
    fn overlong_password_reports_length_violation() {
        let password = format!("Aa1!{}", "x".repeat(130));
        let violations = validate(&password).expect_err("overlong password must fail");
        assert!(violations.contains(&PolicyViolation::TooLong));
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let violations = validate("abc").expect_err("must fail");
        assert_eq!(
            violations,
            vec![
                PolicyViolation::TooShort,
                PolicyViolation::MissingUppercase,
                PolicyViolation::MissingDigit,
                PolicyViolation::MissingSpecial,
            ]
        );
    }

    #[test]
    fn compliant_password_passes() {
        assert_eq!(validate("Str0ng!pass"), Ok(()));
    }

    #[test]
    fn full_mix_long_password_scores_100_very_strong() {
        for password in ["Abcdefg1!hijklmn", "XyZ9#aaaa bbbb cccc"] {
            assert_eq!(score(password), 100, "score for {password:?}");
            assert_eq!(strength_label(score(password)), StrengthLabel::VeryStrong);
        }
    }

    #[test]
    fn score_length_buckets() {
        // Lowercase only keeps the composition component fixed at 10.
        assert_eq!(score("aaaa"), 10);
        assert_eq!(score("aaaaaaaa"), 20);
        assert_eq!(score("aaaaaaaaaaaa"), 30);
        assert_eq!(score("aaaaaaaaaaaaaaaa"), 40);
    }

    #[test]
    fn composition_component_is_capped_at_70() {
        // All four classes plus the bonus would be 80 uncapped.
        let short_mix = "Aa1!";
        assert_eq!(score(short_mix), 70);
    }

    #[test]
    fn strength_label_boundaries() {
        assert_eq!(strength_label(0), StrengthLabel::Weak);
        assert_eq!(strength_label(29), StrengthLabel::Weak);
        assert_eq!(strength_label(30), StrengthLabel::Medium);
        assert_eq!(strength_label(59), StrengthLabel::Medium);
        assert_eq!(strength_label(60), StrengthLabel::Strong);
        assert_eq!(strength_label(79), StrengthLabel::Strong);
        assert_eq!(strength_label(80), StrengthLabel::VeryStrong);
        assert_eq!(strength_label(100), StrengthLabel::VeryStrong);
    }

    #[test]
    fn violation_messages_are_stable() {
        assert_eq!(
            PolicyViolation::TooShort.to_string(),
            "Password must be at least 8 characters long"
        );
        assert_eq!(
            PolicyViolation::MissingSpecial.to_string(),
            "Password must contain at least one special character"
        );
    }
}
