//! Node and edge identifiers.
//!
//! Both are UUID v7 newtypes, so ids created later sort later. They serialize
//! as the plain UUID string.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! workflow_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[derive(Debug, Display, From, Into)]
        #[debug("{_0}")]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

workflow_id! {
    /// Identifies a node instance within a workflow graph.
    NodeId
}

workflow_id! {
    /// Identifies an edge within a workflow graph.
    EdgeId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parses_from_string() {
        let uuid = Uuid::from_u128(42);
        let id: NodeId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<NodeId>().is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = EdgeId::from_uuid(Uuid::from_u128(7));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", Uuid::from_u128(7)));
    }

    #[test]
    fn later_ids_sort_later() {
        let first = NodeId::new();
        let second = NodeId::new();
        assert!(first < second);
    }
}
