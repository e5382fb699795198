//! Role-based redirects and section guards

use std::fmt;

use crate::session::SessionSnapshot;
use crate::user::{Role, RoleKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    AdminDashboard,
    OrganizerDashboard,
    UserProfile,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::AdminDashboard => "/admin",
            Route::OrganizerDashboard => "/organizador",
            Route::UserProfile => "/perfil",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a freshly logged-in user lands
pub fn redirect_target(role: Option<&Role>) -> Route {
    landing_route(role.map(Role::kind).unwrap_or(RoleKind::User))
}

fn landing_route(kind: RoleKind) -> Route {
    match kind {
        RoleKind::Administrator => Route::AdminDashboard,
        RoleKind::Organizer => Route::OrganizerDashboard,
        RoleKind::User => Route::Home,
    }
}

/// Role-scoped areas of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Public,
    UserArea,
    OrganizerArea,
    AdminArea,
}

impl Section {
    fn admits(&self, kind: RoleKind) -> bool {
        match self {
            Section::Public | Section::UserArea => true,
            Section::OrganizerArea => {
                matches!(kind, RoleKind::Organizer | RoleKind::Administrator)
            }
            Section::AdminArea => kind == RoleKind::Administrator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Session check still running; render nothing role-gated yet
    Wait,
    Redirect(Route),
}

/// Decide whether the current session may enter `section`
pub fn guard(snapshot: &SessionSnapshot, section: Section) -> Access {
    if section == Section::Public {
        return Access::Allow;
    }
    if snapshot.is_loading() {
        return Access::Wait;
    }

    let Some(user) = snapshot.user().filter(|_| snapshot.is_authenticated()) else {
        return Access::Redirect(Route::Login);
    };

    let kind = user.role_kind();
    if section.admits(kind) {
        Access::Allow
    } else {
        Access::Redirect(landing_route(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::user::User;

    fn user_with_role(role_id: Option<i64>) -> User {
        User {
            id: 1,
            display_name: "Test".to_string(),
            email: "user@test.com".to_string(),
            role: role_id.map(|id| Role { id, name: None }),
            avatar_url: None,
            bio: None,
            interests: Vec::new(),
        }
    }

    fn authenticated(role_id: Option<i64>) -> SessionSnapshot {
        SessionSnapshot::new(
            SessionState::Authenticated,
            Some(user_with_role(role_id)),
            Some("a1".to_string()),
        )
    }

    #[test]
    fn redirect_targets_follow_role() {
        let admin = Role { id: 1, name: None };
        let organizer = Role { id: 2, name: None };
        let user = Role { id: 3, name: None };

        assert_eq!(redirect_target(Some(&admin)), Route::AdminDashboard);
        assert_eq!(redirect_target(Some(&organizer)), Route::OrganizerDashboard);
        assert_eq!(redirect_target(Some(&user)), Route::Home);
        assert_eq!(redirect_target(None), Route::Home);
        assert_eq!(Route::AdminDashboard.path(), "/admin");
    }

    #[test]
    fn public_section_always_allowed() {
        let loading = SessionSnapshot::new(SessionState::Loading, None, Some("a1".to_string()));
        assert_eq!(guard(&loading, Section::Public), Access::Allow);
        assert_eq!(guard(&SessionSnapshot::default(), Section::Public), Access::Allow);
    }

    #[test]
    fn loading_session_waits() {
        let loading = SessionSnapshot::new(SessionState::Loading, None, Some("a1".to_string()));
        assert_eq!(guard(&loading, Section::AdminArea), Access::Wait);
    }

    #[test]
    fn anonymous_visitors_go_to_login() {
        let anonymous = SessionSnapshot::new(SessionState::Unauthenticated, None, None);
        assert_eq!(guard(&anonymous, Section::UserArea), Access::Redirect(Route::Login));
    }

    #[test]
    fn roles_reach_their_sections() {
        assert_eq!(guard(&authenticated(Some(1)), Section::AdminArea), Access::Allow);
        assert_eq!(guard(&authenticated(Some(1)), Section::OrganizerArea), Access::Allow);
        assert_eq!(guard(&authenticated(Some(2)), Section::OrganizerArea), Access::Allow);
        assert_eq!(guard(&authenticated(None), Section::UserArea), Access::Allow);
    }

    #[test]
    fn roles_are_bounced_to_their_landing() {
        assert_eq!(
            guard(&authenticated(Some(2)), Section::AdminArea),
            Access::Redirect(Route::OrganizerDashboard)
        );
        assert_eq!(
            guard(&authenticated(Some(3)), Section::OrganizerArea),
            Access::Redirect(Route::Home)
        );
    }
}
