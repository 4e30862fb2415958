//! Core identity types for the stategraph workflow executor.
//!
//! [`NodeKind`] identifies nodes in a workflow graph. `Start` and `End` are
//! virtual: they carry no implementation, have no incoming (`Start`) or
//! outgoing (`End`) edges, and exist only as routing endpoints.
//!
//! # Examples
//!
//! ```rust
//! use stategraph::types::NodeKind;
//!
//! let start = NodeKind::Start;
//! let worker: NodeKind = "summarize".into();
//! assert!(worker.is_custom());
//! assert_eq!(worker.to_string(), "summarize");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `Custom` names must be unique within a graph; common patterns are
/// function names, service names, or step descriptions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry point. The first edge of every graph leaves `Start`.
    Start,
    /// Virtual terminal. A frontier consisting only of `End` completes the run.
    End,
    /// Custom node identified by a user-defined string.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the virtual [`Start`](Self::Start) node.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the virtual [`End`](Self::End) node.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is a custom node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Developer Experience: allow using string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}
