pub mod contact;
pub mod duplicate;

pub use contact::{Contact, ContactPatch, ContactsResponse, LeadRating, LeadStatus};
pub use duplicate::{
    group_key, AbsorbedDuplicate, Confidence, DismissGroupRequest, DismissedEntry,
    DuplicateGroup, DuplicateGroupsResponse, FailedDuplicate, MatchType, MergeContactsRequest,
    MergeContactsResponse, MergePreviewResponse, ScanSummary,
};
