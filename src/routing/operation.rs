//! Operations a resource may permit.

use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// An operation on a logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Link,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Link => "link",
        }
    }

    /// Map an HTTP method to the operation it performs.
    ///
    /// POST is `link` when the path targets a relationship, `create`
    /// otherwise. Methods with no data semantics map to `None`.
    pub fn from_method(method: &Method, link_request: bool) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Operation::Read),
            Method::POST if link_request => Some(Operation::Link),
            Method::POST => Some(Operation::Create),
            Method::PATCH | Method::PUT => Some(Operation::Update),
            Method::DELETE => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
