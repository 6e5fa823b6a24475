//! Typed string identifiers used across the Turnera crates.
//!
//! Every id is a thin newtype over `String`; the wrapper exists so that a
//! queue id can never be passed where a ticket id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a service queue.
    QueueId
);

string_id!(
    /// Identifier of a ticket (one customer's place in a queue).
    TicketId
);

string_id!(
    /// Identifier of one open watch session. Client-supplied on subscribe or
    /// generated by the server; unique per connection.
    WatchId
);

string_id!(
    /// Identifier of the tenant that owns a queue.
    TenantId
);
