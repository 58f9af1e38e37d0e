//! Status predicates.

use authloop_protocol::AuthOutcome;

use crate::snapshot::SessionSnapshot;
use crate::status::AuthStatus;

impl SessionSnapshot {
    pub fn is_start(&self) -> bool {
        self.status == AuthStatus::Start
    }

    /// `true` in `auth_known`, and also whenever the last answer held is
    /// `ok`, even while a new probe is out.
    pub fn is_auth_known(&self) -> bool {
        self.status == AuthStatus::AuthKnown || self.auth.outcome == AuthOutcome::Ok
    }

    pub fn is_auth_unknown(&self) -> bool {
        !self.is_auth_known()
    }

    pub fn is_authenticating(&self) -> bool {
        self.status == AuthStatus::Authenticating
    }

    pub fn is_auth_changing(&self) -> bool {
        self.status == AuthStatus::AuthChanging
    }

    pub fn is_auth_error(&self) -> bool {
        self.status == AuthStatus::AuthError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_status(status: AuthStatus) -> SessionSnapshot {
        SessionSnapshot {
            status,
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn test_fresh_snapshot_is_start_and_unknown() {
        let s = SessionSnapshot::new();
        assert!(s.is_start());
        assert!(s.is_auth_unknown());
        assert!(!s.is_auth_known());
        assert!(!s.is_authenticating());
        assert!(!s.is_auth_changing());
        assert!(!s.is_auth_error());
    }

    #[test]
    fn test_is_auth_known_in_auth_known_status() {
        assert!(in_status(AuthStatus::AuthKnown).is_auth_known());
    }

    #[test]
    fn test_is_auth_known_with_ok_outcome_while_probing() {
        let mut s = in_status(AuthStatus::AuthUnknown);
        s.auth.outcome = AuthOutcome::Ok;

        assert!(s.is_auth_known());
        assert!(!s.is_auth_unknown());
    }

    #[test]
    fn test_each_status_predicate_matches_only_its_status() {
        for status in AuthStatus::ALL {
            let s = in_status(status);
            assert_eq!(s.is_start(), status == AuthStatus::Start);
            assert_eq!(s.is_authenticating(), status == AuthStatus::Authenticating);
            assert_eq!(s.is_auth_changing(), status == AuthStatus::AuthChanging);
            assert_eq!(s.is_auth_error(), status == AuthStatus::AuthError);
        }
    }
}
