use anonsignals_crypto::Group;
use anonsignals_types::{AnonResult, FieldElement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One row of the authoritative membership list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub commitment: FieldElement,
    pub joined_at: DateTime<Utc>,
}

/// Commitments in join order. Ties keep their input order, so the caller
/// must also fetch ties in a stable order for the root to be reproducible.
pub fn ordered_commitments(members: &[MemberEntry]) -> Vec<FieldElement> {
    let mut sorted: Vec<&MemberEntry> = members.iter().collect();
    sorted.sort_by_key(|m| m.joined_at);
    sorted.into_iter().map(|m| m.commitment).collect()
}

pub fn rebuild_group(members: &[MemberEntry]) -> AnonResult<Group> {
    let group = Group::rebuild(&ordered_commitments(members))?;
    info!("Rebuilt group of {} members, root {}", group.size(), group.root());
    Ok(group)
}
