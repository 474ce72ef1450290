//! Structured run events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Origin;

/// Something a host may want to show or record about a run.
///
/// `origin` is always the document that caused the event (a patch, or the
/// data document being filtered); `target` is the document being changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PatchEvent {
    PassStarted {
        pass: String,
        patches: usize,
    },
    ApplyingEdit {
        origin: Origin,
        target: Origin,
    },
    ApplyingCopy {
        origin: Origin,
        target: Origin,
    },
    ApplyingDelete {
        origin: Origin,
        target: Origin,
    },
    PatchLoop {
        origin: Origin,
        target: Origin,
        iteration: usize,
    },
    NeedsUnsatisfiedRoot {
        origin: Origin,
    },
    NeedsUnsatisfiedNode {
        origin: Origin,
        path: String,
    },
    NeedsUnsatisfiedValue {
        origin: Origin,
        path: String,
    },
    NeedsUnsatisfiedPass {
        origin: Origin,
        pass: String,
    },
    Warning {
        origin: Origin,
        message: String,
    },
    Error {
        origin: Origin,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<Origin>,
        message: String,
    },
    Exception {
        origin: Origin,
        message: String,
        patch: String,
    },
}

impl PatchEvent {
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            PatchEvent::PassStarted { .. } => None,
            PatchEvent::ApplyingEdit { origin, .. }
            | PatchEvent::ApplyingCopy { origin, .. }
            | PatchEvent::ApplyingDelete { origin, .. }
            | PatchEvent::PatchLoop { origin, .. }
            | PatchEvent::NeedsUnsatisfiedRoot { origin }
            | PatchEvent::NeedsUnsatisfiedNode { origin, .. }
            | PatchEvent::NeedsUnsatisfiedValue { origin, .. }
            | PatchEvent::NeedsUnsatisfiedPass { origin, .. }
            | PatchEvent::Warning { origin, .. }
            | PatchEvent::Error { origin, .. }
            | PatchEvent::Exception { origin, .. } => Some(origin),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PatchEvent::Error { .. } | PatchEvent::Exception { .. })
    }
}

impl fmt::Display for PatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchEvent::PassStarted { pass, patches } => {
                write!(f, "{} pass ({} patches)", pass, patches)
            }
            PatchEvent::ApplyingEdit { origin, target } => {
                write!(f, "Applying update {} to {}", origin, target)
            }
            PatchEvent::ApplyingCopy { origin, target } => {
                write!(f, "Applying copy {} to {}", origin, target)
            }
            PatchEvent::ApplyingDelete { origin, target } => {
                write!(f, "Applying delete {} to {}", origin, target)
            }
            PatchEvent::PatchLoop {
                origin,
                target,
                iteration,
            } => write!(f, "Looping {} on {} (iteration {})", origin, target, iteration),
            PatchEvent::NeedsUnsatisfiedRoot { origin } => {
                write!(f, "Deleting root node {}: :NEEDS not satisfied", origin)
            }
            PatchEvent::NeedsUnsatisfiedNode { origin, path } => {
                write!(f, "Deleting node {} in {}: :NEEDS not satisfied", path, origin)
            }
            PatchEvent::NeedsUnsatisfiedValue { origin, path } => {
                write!(f, "Deleting value {} in {}: :NEEDS not satisfied", path, origin)
            }
            PatchEvent::NeedsUnsatisfiedPass { origin, pass } => {
                write!(f, "Skipping {}: {} refers to an unknown identifier", origin, pass)
            }
            PatchEvent::Warning { origin, message } => write!(f, "{}: {}", origin, message),
            PatchEvent::Error {
                origin,
                target: Some(target),
                message,
            } => write!(f, "{} on {}: {}", origin, target, message),
            PatchEvent::Error {
                origin,
                target: None,
                message,
            } => write!(f, "{}: {}", origin, message),
            PatchEvent::Exception {
                origin, message, ..
            } => write!(f, "Exception while applying {}: {}", origin, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = PatchEvent::ApplyingEdit {
            origin: Origin::new("a.cfg", "@PART[x]"),
            target: Origin::new("b.cfg", "PART"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "applying_edit");
        assert_eq!(json["origin"]["url"], "a.cfg");
        assert_eq!(json["target"]["document"], "PART");
    }

    #[test]
    fn test_error_without_target_omits_field() {
        let event = PatchEvent::Error {
            origin: Origin::new("a.cfg", "@PART[x"),
            target: None,
            message: "unbalanced".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("target").is_none());
        assert!(event.is_failure());
        assert_eq!(event.to_string(), "a.cfg/@PART[x: unbalanced");
    }
}
