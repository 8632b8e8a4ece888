//! Relationship models

use crate::schema::{Relationship, RelationshipId};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipCreatedResponse {
    pub id: RelationshipId,
    pub relationship: Relationship,
}
