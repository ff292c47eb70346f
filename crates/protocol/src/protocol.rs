use serde::{Deserialize, Serialize};

use crate::domain::NavDir;

/// Form key carrying the event alias or [`REFRESH_EVENT`].
pub const EVENT_TYPE_KEY: &str = "_eventType";
/// Form key carrying the JSON encoded model of the previous render.
pub const STATE_KEY: &str = "_state";
/// Optional form key carrying the JSON encoded event payload.
pub const EVENT_DATA_KEY: &str = "_eventData";
/// Event type that re-renders the submitted state without a transform.
pub const REFRESH_EVENT: &str = "!refresh";
/// Form keys starting with this character are protocol control keys and never
/// bound to application fields.
pub const RESERVED_PREFIX: char = '_';

pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Classification of the `_eventType` form value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType<'a> {
    Refresh,
    Alias(&'a str),
}

impl<'a> EventType<'a> {
    pub fn parse(raw: &'a str) -> Self {
        if raw == REFRESH_EVENT {
            EventType::Refresh
        } else {
            EventType::Alias(raw)
        }
    }
}

/// Body of a navigation response. `state`, `msg_type` and `msg_data` are
/// reserved for echoing state and a follow-up event and are always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInstruction {
    pub target: String,
    pub nav_dir: NavDir,
    pub state: Option<serde_json::Value>,
    pub msg_type: String,
    pub msg_data: String,
}

impl NavigationInstruction {
    pub fn new(target: impl Into<String>, nav_dir: NavDir) -> Self {
        Self {
            target: target.into(),
            nav_dir,
            state: None,
            msg_type: String::new(),
            msg_data: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Redirect;

    #[test]
    fn refresh_sentinel_is_not_an_alias() {
        assert_eq!(EventType::parse("!refresh"), EventType::Refresh);
        assert_eq!(EventType::parse("increment"), EventType::Alias("increment"));
        assert_eq!(EventType::parse(""), EventType::Alias(""));
    }

    #[test]
    fn reserved_keys_use_underscore_prefix() {
        assert!(is_reserved_key(STATE_KEY));
        assert!(is_reserved_key(EVENT_TYPE_KEY));
        assert!(is_reserved_key(EVENT_DATA_KEY));
        assert!(!is_reserved_key("Count"));
    }

    #[test]
    fn navigation_instruction_wire_shape() {
        let instruction = Redirect::forward("/done").instruction().expect("navigation");
        let json = serde_json::to_value(&instruction).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "target": "/done",
                "navDir": "forward",
                "state": null,
                "msgType": "",
                "msgData": ""
            })
        );
    }

    #[test]
    fn see_other_has_no_instruction() {
        assert!(Redirect::see_other("/login").instruction().is_none());
        let back = Redirect::backward("/list").instruction().expect("navigation");
        assert_eq!(back.nav_dir, NavDir::Backward);
        assert_eq!(NavDir::Replace.as_str(), "replace");
    }
}
