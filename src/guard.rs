//! Route guards.
//!
//! Each guard runs [`SessionManager::enforce_expiry`] first, so visiting a
//! protected route with a stale session ends that session.

use crate::{KeyValueStore, Role, SessionManager};

/// Where the presentation layer should send the user instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Unauthorized,
    Dashboard,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login => "/login",
            Redirect::Unauthorized => "/unauthorized",
            Redirect::Dashboard => "/dashboard/mt-to-mx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Redirect),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Any live session may pass.
pub fn require_authenticated<S: KeyValueStore + 'static>(manager: &SessionManager<S>) -> Access {
    if manager.enforce_expiry() {
        Access::Allow
    } else {
        Access::Redirect(Redirect::Login)
    }
}

/// Only a live session holding `role` may pass; other live sessions are
/// sent to the unauthorized page.
pub fn require_role<S: KeyValueStore + 'static>(manager: &SessionManager<S>, role: Role) -> Access {
    if !manager.enforce_expiry() {
        return Access::Redirect(Redirect::Login);
    }
    match manager.role() {
        Some(current) if current == role => Access::Allow,
        _ => {
            log::debug!(
                target: "vigil::guard",
                "msg=\"route denied\" required={}",
                role
            );
            Access::Redirect(Redirect::Unauthorized)
        }
    }
}

/// Where the root route leads.
pub fn landing<S: KeyValueStore + 'static>(manager: &SessionManager<S>) -> Redirect {
    if manager.enforce_expiry() {
        Redirect::Dashboard
    } else {
        Redirect::Login
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStorage, MemoryStore};
    use crate::SessionConfig;

    fn manager(clock: &ManualClock) -> SessionManager<MemoryStore> {
        SessionManager::with_clock(
            MemoryStorage::new().tab(),
            SessionConfig::default(),
            clock.clone(),
        )
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        let manager = manager(&ManualClock::at_millis(0));

        assert_eq!(require_authenticated(&manager), Access::Redirect(Redirect::Login));
        assert_eq!(require_role(&manager, Role::Admin), Access::Redirect(Redirect::Login));
        assert_eq!(landing(&manager), Redirect::Login);
    }

    #[test]
    fn test_role_gate() {
        let manager = manager(&ManualClock::at_millis(0));

        manager.login("alice", "tok");
        assert!(require_authenticated(&manager).is_allowed());
        assert_eq!(
            require_role(&manager, Role::Admin),
            Access::Redirect(Redirect::Unauthorized)
        );
        assert_eq!(landing(&manager), Redirect::Dashboard);

        manager.login_with_role("bob", "tok2", Role::Admin);
        assert!(require_role(&manager, Role::Admin).is_allowed());
    }

    #[test]
    fn test_stale_session_is_expired_by_guard() {
        let clock = ManualClock::at_millis(0);
        let manager = manager(&clock);
        manager.login_with_role("bob", "tok", Role::Admin);

        clock.advance(Duration::minutes(31));

        assert_eq!(require_role(&manager, Role::Admin), Access::Redirect(Redirect::Login));
        assert!(manager.session().is_none());
    }

    #[test]
    fn test_paths() {
        assert_eq!(Redirect::Login.path(), "/login");
        assert_eq!(Redirect::Unauthorized.path(), "/unauthorized");
        assert_eq!(Redirect::Dashboard.path(), "/dashboard/mt-to-mx");
    }
}
