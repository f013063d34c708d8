use serde::Serialize;

use crate::{session::SessionSnapshot, user::UserRecord};

/// Screens reachable in each tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Splash,
    Login,
    Register,
    Home,
    Profile,
}

/// Top-level screen tree the UI renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenTree {
    Splash,
    /// Stack of login and register; login first.
    AuthStack,
    /// Bottom tabs of home and profile.
    AppTabs,
}

impl ScreenTree {
    pub fn screens(self) -> &'static [Screen] {
        match self {
            ScreenTree::Splash => &[Screen::Splash],
            ScreenTree::AuthStack => &[Screen::Login, Screen::Register],
            ScreenTree::AppTabs => &[Screen::Home, Screen::Profile],
        }
    }

    pub fn initial_screen(self) -> Screen {
        self.screens()[0]
    }
}

/// The splash always wins; after it, a user means the app tabs.
pub fn route(user: Option<&UserRecord>, show_splash: bool) -> ScreenTree {
    match (show_splash, user) {
        (true, _) => ScreenTree::Splash,
        (false, Some(_)) => ScreenTree::AppTabs,
        (false, None) => ScreenTree::AuthStack,
    }
}

pub fn route_snapshot(snapshot: &SessionSnapshot) -> ScreenTree {
    route(snapshot.user.as_ref(), snapshot.show_splash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Specialty;
    use time::OffsetDateTime;

    fn user() -> UserRecord {
        UserRecord {
            id: "u1".into(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
            age: 22,
            specialty: Specialty::Software,
            profile_image: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        }
    }

    #[test]
    fn all_four_combinations() {
        let u = user();
        assert_eq!(route(None, true), ScreenTree::Splash);
        assert_eq!(route(Some(&u), true), ScreenTree::Splash);
        assert_eq!(route(None, false), ScreenTree::AuthStack);
        assert_eq!(route(Some(&u), false), ScreenTree::AppTabs);
    }

    #[test]
    fn initial_screens() {
        assert_eq!(ScreenTree::AuthStack.initial_screen(), Screen::Login);
        assert_eq!(ScreenTree::AppTabs.initial_screen(), Screen::Home);
        assert_eq!(ScreenTree::Splash.screens(), &[Screen::Splash]);
    }

    #[test]
    fn snapshot_routing() {
        let snap = SessionSnapshot {
            user: Some(user()),
            is_loading: false,
            show_splash: false,
        };
        assert_eq!(route_snapshot(&snap), ScreenTree::AppTabs);
    }
}
