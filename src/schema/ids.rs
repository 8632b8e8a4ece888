//! Entity identities
//!
//! Identities are opaque integers handed out by the owning store. The core
//! never invents them on its own; an entity without one has not been persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of a designer project
    ProjectId
);
entity_id!(
    /// Identity of a table within a project
    TableId
);
entity_id!(
    /// Identity of a column
    ColumnId
);
entity_id!(
    /// Identity of an index
    IndexId
);
entity_id!(
    /// Identity of a relationship (foreign key)
    RelationshipId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&ColumnId(42)).unwrap();
        assert_eq!(json, "42");

        let back: TableId = serde_json::from_str("7").unwrap();
        assert_eq!(back, TableId(7));
        assert_eq!(back.to_string(), "7");
    }
}
