//! Client-side identifier generation.
//!
//! Entities created before the backend has assigned them a durable identity
//! get a short collision-resistant id. Durable ids are stringified backend
//! integers and replace the client id during migration.

use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated client ids.
const ID_LEN: usize = 11;

/// Generates a new short, collision-resistant client id.
pub fn new_id() -> String {
    nanoid!(ID_LEN)
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generates a fresh client-local id.
            pub fn generate() -> Self {
                Self(new_id())
            }

            /// Wraps a backend-assigned numeric id.
            pub fn from_durable(id: u64) -> Self {
                Self(id.to_string())
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identity of a query editor tab.
    EditorId
);
string_id!(
    /// Identity of a submitted query.
    QueryId
);
string_id!(
    /// Identity of a schema-browser table entry.
    TableId
);
