use serde::{Deserialize, Serialize};

use crate::protocol::NavigationInstruction;

/// Direction of a client-side navigation, mirrored onto the browser history
/// stack by the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDir {
    Forward,
    Backward,
    Replace,
}

impl NavDir {
    pub fn as_str(self) -> &'static str {
        match self {
            NavDir::Forward => "forward",
            NavDir::Backward => "backward",
            NavDir::Replace => "replace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Answered with a JSON [`NavigationInstruction`] which the shim applies
    /// to its history stack. Plain HTTP redirects cannot express this.
    Navigate(NavDir),
    /// Answered with `303 See Other`, for pages posted by a plain `<form>`.
    SeeOther,
}

/// Navigation requested by a transform instead of rendering the next model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    target: String,
    kind: RedirectKind,
}

impl Redirect {
    /// Navigate forward to `target`. Use query parameters to carry
    /// bookmarkable context.
    pub fn forward(target: impl Into<String>) -> Self {
        Self::navigate(target, NavDir::Forward)
    }

    pub fn backward(target: impl Into<String>) -> Self {
        Self::navigate(target, NavDir::Backward)
    }

    pub fn replace(target: impl Into<String>) -> Self {
        Self::navigate(target, NavDir::Replace)
    }

    pub fn navigate(target: impl Into<String>, direction: NavDir) -> Self {
        Self {
            target: target.into(),
            kind: RedirectKind::Navigate(direction),
        }
    }

    pub fn see_other(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: RedirectKind::SeeOther,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> RedirectKind {
        self.kind
    }

    /// The JSON instruction for a client navigation, `None` for HTTP redirects.
    pub fn instruction(&self) -> Option<NavigationInstruction> {
        match self.kind {
            RedirectKind::Navigate(direction) => {
                Some(NavigationInstruction::new(self.target.clone(), direction))
            }
            RedirectKind::SeeOther => None,
        }
    }
}
