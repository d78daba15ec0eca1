//! User preferences kept in `localStorage`. The overlay transform is not
//! persisted.

use serde::{Deserialize, Serialize};

const STORAGE_KEY: &str = "overlay_settings";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    User,
    Environment,
}

impl Facing {
    /// Value for the `facingMode` track constraint.
    pub fn as_constraint(self) -> &'static str {
        match self {
            Facing::User => "user",
            Facing::Environment => "environment",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Facing::User => Facing::Environment,
            Facing::Environment => Facing::User,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub opacity: f64,
    pub facing: Facing,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            opacity: 0.5,
            facing: Facing::User,
        }
    }
}

impl OverlaySettings {
    pub fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str::<OverlaySettings>(raw) {
            Ok(mut s) => {
                s.opacity = crate::render::normalize_opacity(s.opacity, 0.5);
                Some(s)
            }
            Err(e) => {
                log::warn!("ignoring stored settings: {}", e);
                None
            }
        }
    }

    pub fn load() -> Self {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                if let Ok(Some(raw)) = store.get_item(STORAGE_KEY) {
                    if let Some(s) = Self::from_json(&raw) {
                        return s;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                if let Ok(s) = serde_json::to_string(self) {
                    let _ = store.set_item(STORAGE_KEY, &s);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_settings_round_trip_through_json() {
        let s = OverlaySettings {
            opacity: 0.8,
            facing: Facing::Environment,
        };
        let raw = serde_json::to_string(&s).unwrap();
        assert_eq!(OverlaySettings::from_json(&raw), Some(s));
    }

    #[test]
    fn missing_fields_take_defaults_and_opacity_is_clamped() {
        let s = OverlaySettings::from_json(r#"{"opacity": 4.0}"#).unwrap();
        assert_eq!(s.opacity, 1.0);
        assert_eq!(s.facing, Facing::User);
        assert!(OverlaySettings::from_json("not json").is_none());
    }

    #[test]
    fn facing_toggles() {
        assert_eq!(Facing::User.toggled(), Facing::Environment);
        assert_eq!(Facing::User.toggled().toggled().as_constraint(), "user");
    }
}
