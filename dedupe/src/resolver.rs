//! Field-level resolution of a merge.
//!
//! `compute_merged_fields` is pure: it only describes what the primary should
//! gain from its duplicates. The primary's own non-empty values always win.

use std::collections::HashSet;

use shared_types::{Contact, ContactPatch, LeadRating};

pub fn compute_merged_fields(primary: &Contact, duplicates: &[Contact]) -> ContactPatch {
    let mut patch = ContactPatch {
        email: fill_text(&primary.email, duplicates, |c| &c.email),
        phone: fill_text(&primary.phone, duplicates, |c| &c.phone),
        avatar_url: fill_text(&primary.avatar_url, duplicates, |c| &c.avatar_url),
        company_id: fill_text(&primary.company_id, duplicates, |c| &c.company_id),
        job_title: fill_text(&primary.job_title, duplicates, |c| &c.job_title),
        lead_source: fill_text(&primary.lead_source, duplicates, |c| &c.lead_source),
        owner_agent_id: fill_text(&primary.owner_agent_id, duplicates, |c| &c.owner_agent_id),
        notes: fill_text(&primary.notes, duplicates, |c| &c.notes),
        ..Default::default()
    };

    if primary.last_contacted_at.is_none() {
        patch.last_contacted_at = duplicates.iter().find_map(|d| d.last_contacted_at);
    }

    patch.tags = union_tags(primary, duplicates);
    patch.custom_fields = union_custom_fields(primary, duplicates);
    patch.lead = best_lead(primary, duplicates);

    patch
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// First non-empty duplicate value, only when the primary's own value is empty.
fn fill_text<F>(current: &Option<String>, duplicates: &[Contact], field: F) -> Option<String>
where
    F: Fn(&Contact) -> &Option<String>,
{
    if !is_blank(current) {
        return None;
    }
    duplicates
        .iter()
        .map(|d| field(d))
        .find(|value| !is_blank(value))
        .cloned()
        .flatten()
}

fn union_tags(primary: &Contact, duplicates: &[Contact]) -> Option<Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::new();

    for tag in &primary.tags {
        if seen.insert(tag.as_str()) {
            merged.push(tag.clone());
        }
    }
    let primary_count = merged.len();

    for tag in duplicates.iter().flat_map(|d| d.tags.iter()) {
        if seen.insert(tag.as_str()) {
            merged.push(tag.clone());
        }
    }

    (merged.len() > primary_count).then_some(merged)
}

fn union_custom_fields(
    primary: &Contact,
    duplicates: &[Contact],
) -> Option<std::collections::BTreeMap<String, serde_json::Value>> {
    let mut merged = primary.custom_fields.clone();
    for duplicate in duplicates {
        for (key, value) in &duplicate.custom_fields {
            merged
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    (merged.len() > primary.custom_fields.len()).then_some(merged)
}

/// Highest score wins, and its label comes with it.
fn best_lead(primary: &Contact, duplicates: &[Contact]) -> Option<LeadRating> {
    let best = duplicates.iter().fold(None::<&Contact>, |best, d| match best {
        Some(b) if b.lead_score >= d.lead_score => Some(b),
        _ => Some(d),
    })?;

    (best.lead_score > primary.lead_score).then_some(LeadRating {
        score: best.lead_score,
        status: best.lead_status,
    })
}
