use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::contact::{Contact, ContactPatch};

/// Which signal placed the contacts of a group together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Email,
    Phone,
    Name,
}

impl MatchType {
    pub fn confidence(&self) -> Confidence {
        match self {
            MatchType::Email => Confidence::High,
            MatchType::Phone => Confidence::Medium,
            MatchType::Name => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Contacts believed to be the same person. Derived on every scan, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DuplicateGroup {
    pub contacts: Vec<Contact>,
    pub match_type: MatchType,
    pub confidence: Confidence,
}

impl DuplicateGroup {
    pub fn new(contacts: Vec<Contact>, match_type: MatchType) -> Self {
        Self {
            contacts,
            match_type,
            confidence: match_type.confidence(),
        }
    }

    pub fn contact_ids(&self) -> Vec<&str> {
        self.contacts.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn contains(&self, contact_id: &str) -> bool {
        self.contacts.iter().any(|c| c.id == contact_id)
    }

    /// Order-independent identity of the group, used by the dismissal ledger.
    pub fn key(&self) -> String {
        group_key(self.contact_ids())
    }
}

/// Sorted, pipe-joined member ids.
pub fn group_key<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids: Vec<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
    ids.sort();
    ids.join("|")
}

/// A group an operator reviewed and judged not to be duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DismissedEntry {
    pub key: String,
    pub match_type: MatchType,
    pub dismissed_at: i64,
}

impl DismissedEntry {
    pub fn contact_ids(&self) -> impl Iterator<Item = &str> {
        self.key.split('|')
    }
}

/// Group counts of one matcher run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanSummary {
    pub email_groups: usize,
    pub phone_groups: usize,
    pub name_groups: usize,
    pub contacts_grouped: usize,
}

impl ScanSummary {
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        let mut summary = ScanSummary::default();
        for group in groups {
            match group.match_type {
                MatchType::Email => summary.email_groups += 1,
                MatchType::Phone => summary.phone_groups += 1,
                MatchType::Name => summary.name_groups += 1,
            }
            summary.contacts_grouped += group.contacts.len();
        }
        summary
    }

    pub fn total_groups(&self) -> usize {
        self.email_groups + self.phone_groups + self.name_groups
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct DuplicateGroupsResponse {
    pub groups: Vec<DuplicateGroup>,
    pub summary: ScanSummary,
    pub dismissed_count: usize,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct DismissGroupRequest {
    pub contact_ids: Vec<String>,
    pub match_type: MatchType,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct MergeContactsRequest {
    pub primary_id: String,
    pub duplicate_ids: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct MergePreviewResponse {
    pub primary_id: String,
    pub patch: ContactPatch,
}

/// A duplicate that was folded into the primary and deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AbsorbedDuplicate {
    pub contact_id: String,
    pub reassigned_records: usize,
}

/// A duplicate left in place because a store call failed; safe to retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FailedDuplicate {
    pub contact_id: String,
    pub error: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct MergeContactsResponse {
    pub success: bool,
    pub primary_id: String,
    pub patch: ContactPatch,
    pub absorbed: Vec<AbsorbedDuplicate>,
    pub failed: Vec<FailedDuplicate>,
}
