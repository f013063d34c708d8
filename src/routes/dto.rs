use serde::Serialize;

use crate::{
    navigation::{route_snapshot, Screen, ScreenTree},
    session::SessionSnapshot,
    user::{Specialty, UserRecord},
};

/// What the UI needs to render: session state plus the screen tree for it.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: Option<UserRecord>,
    pub is_loading: bool,
    pub show_splash: bool,
    pub screen_tree: ScreenTree,
    pub initial_screen: Screen,
}

impl From<SessionSnapshot> for SessionView {
    fn from(snapshot: SessionSnapshot) -> Self {
        let screen_tree = route_snapshot(&snapshot);
        Self {
            user: snapshot.user,
            is_loading: snapshot.is_loading,
            show_splash: snapshot.show_splash,
            screen_tree,
            initial_screen: screen_tree.initial_screen(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SpecialtyOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn specialty_options() -> Vec<SpecialtyOption> {
    Specialty::ALL
        .into_iter()
        .map(|s| SpecialtyOption {
            value: s.tag(),
            label: s.label(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_of_fresh_session_is_splash() {
        let view = SessionView::from(SessionSnapshot {
            user: None,
            is_loading: true,
            show_splash: true,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["screen_tree"], "splash");
        assert_eq!(json["initial_screen"], "splash");
        assert!(json["user"].is_null());
    }

    #[test]
    fn options_cover_every_specialty() {
        let opts = specialty_options();
        assert_eq!(opts.len(), Specialty::ALL.len());
        assert_eq!(opts[0].value, "software");
        assert_eq!(opts[0].label, "Software Development");
    }
}
