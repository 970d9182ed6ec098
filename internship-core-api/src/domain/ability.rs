//! Ability (scope) matching.
//!
//! An ability held by a session covers a required ability when the two are
//! equal, when the held ability is `*`, or when the held ability ends in `*`
//! and the required ability starts with everything before that `*`.

/// Wildcard ability granting everything.
pub const ABILITY_ALL: &str = "*";

pub const ABILITY_APPROVALS_READ: &str = "approvals.read";
pub const ABILITY_APPROVALS_DECIDE: &str = "approvals.decide";
pub const ABILITY_APPROVALS_WITHDRAW: &str = "approvals.withdraw";
pub const ABILITY_APPROVALS_OVERRIDE: &str = "approvals.override";
pub const ABILITY_EVALUATIONS_READ: &str = "evaluations.read";
pub const ABILITY_EVALUATIONS_SUBMIT: &str = "evaluations.submit";
pub const ABILITY_EVALUATIONS_ASSIGN: &str = "evaluations.assign";
pub const ABILITY_EVALUATIONS_MANAGE: &str = "evaluations.manage";
pub const ABILITY_PROFILE_READ: &str = "profile.read";

/// Abilities granted to every student on login.
pub const STUDENT_ABILITIES: &[&str] = &[
    ABILITY_PROFILE_READ,
    ABILITY_APPROVALS_READ,
    ABILITY_APPROVALS_WITHDRAW,
    ABILITY_EVALUATIONS_READ,
    ABILITY_EVALUATIONS_SUBMIT,
];

/// Returns true when `held` covers `required`.
pub fn ability_matches(held: &str, required: &str) -> bool {
    if held == required || held == ABILITY_ALL {
        return true;
    }
    match held.strip_suffix('*') {
        Some(prefix) => required.starts_with(prefix),
        None => false,
    }
}

/// Returns true when any ability in `abilities` covers `required`.
pub fn has_ability<S: AsRef<str>>(abilities: &[S], required: &str) -> bool {
    abilities
        .iter()
        .any(|held| ability_matches(held.as_ref(), required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(has_ability(&["users.read"], "users.read"));
        assert!(!has_ability(&["users.read"], "users.write"));
    }

    #[test]
    fn test_global_wildcard() {
        assert!(has_ability(&["*"], "anything.at.all"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(has_ability(&["users.*"], "users.read"));
        assert!(has_ability(&["users.*"], "users."));
        assert!(!has_ability(&["users.*"], "user.read"));
        assert!(!has_ability(&["users.*"], "approvals.read"));
    }

    #[test]
    fn test_empty_set_denies() {
        let none: [&str; 0] = [];
        assert!(!has_ability(&none, "users.read"));
    }

    #[test]
    fn test_student_defaults() {
        assert!(has_ability(STUDENT_ABILITIES, ABILITY_APPROVALS_WITHDRAW));
        assert!(!has_ability(STUDENT_ABILITIES, ABILITY_APPROVALS_OVERRIDE));
    }
}
