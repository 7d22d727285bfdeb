#![allow(clippy::module_name_repetitions)]

//! Typed newtype identifiers shared across the gateway request pipeline.
//!
//! Every boundary that used to pass a bare `String` (user id, conversation
//! id, tool-call id, service class id, request id) gets its own type here so
//! mixing them up is a compile error rather than a runtime surprise.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Caller-supplied identifier for the end user on whose behalf the agent runs.
    UserId
);
string_id!(
    /// Caller-supplied identifier for the conversation a request belongs to.
    ConversationId
);
string_id!(
    /// Stable identifier of a registered [`Service`](https://docs.rs/gateway-traits) class.
    ServiceClassId
);
string_id!(
    /// Identifier assigned to one tool invocation within an agent loop iteration.
    ToolCallId
);
string_id!(
    /// Per-request identifier used to correlate logs, SSE events, and error bodies.
    RequestId
);
string_id!(
    /// Distributed-trace id propagated to downstream HTTP calls (wrappers, remote catalogs).
    TraceId
);

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl Default for ToolCallId {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serde() {
        let id = UserId::new("user-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-42\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
