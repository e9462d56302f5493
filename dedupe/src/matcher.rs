//! Three-pass duplicate detection.
//!
//! Passes run in priority order (email, phone, name). A contact claimed by
//! one pass is invisible to the passes after it, so every contact lands in
//! at most one group per run. Output order is deterministic for a given
//! input order: email groups, then phone groups, then name clusters, each
//! in order of their first member.

use std::collections::HashMap;

use shared_types::{Contact, DuplicateGroup, MatchType};
use tracing::debug;

use crate::normalize::{normalize_email, normalize_name, normalize_phone, MIN_PHONE_DIGITS};
use crate::similarity::levenshtein_distance;

/// Largest edit distance at which two names are still considered the same person.
pub const MAX_NAME_DISTANCE: usize = 2;

/// Names shorter than this never take part in the name pass.
pub const MIN_NAME_LENGTH: usize = 3;

pub fn find_duplicates(contacts: &[Contact]) -> Vec<DuplicateGroup> {
    let mut claimed = vec![false; contacts.len()];
    let mut groups = Vec::new();

    let email_groups = group_by_key(contacts, &mut claimed, MatchType::Email, |c| {
        let email = normalize_email(c.email.as_deref());
        (!email.is_empty()).then_some(email)
    });
    debug!("Email pass produced {} groups", email_groups.len());
    groups.extend(email_groups);

    let phone_groups = group_by_key(contacts, &mut claimed, MatchType::Phone, |c| {
        let phone = normalize_phone(c.phone.as_deref());
        (phone.len() >= MIN_PHONE_DIGITS).then_some(phone)
    });
    debug!("Phone pass produced {} groups", phone_groups.len());
    groups.extend(phone_groups);

    let name_groups = cluster_by_name(contacts, &mut claimed);
    debug!("Name pass produced {} groups", name_groups.len());
    groups.extend(name_groups);

    groups
}

/// Exact-key grouping over the unclaimed contacts. Groups keep the order in
/// which their key was first seen.
fn group_by_key<F>(
    contacts: &[Contact],
    claimed: &mut [bool],
    match_type: MatchType,
    key_of: F,
) -> Vec<DuplicateGroup>
where
    F: Fn(&Contact) -> Option<String>,
{
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut bucket_index: HashMap<String, usize> = HashMap::new();

    for (idx, contact) in contacts.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let Some(key) = key_of(contact) else {
            continue;
        };
        match bucket_index.get(&key) {
            Some(&b) => buckets[b].push(idx),
            None => {
                bucket_index.insert(key, buckets.len());
                buckets.push(vec![idx]);
            }
        }
    }

    buckets
        .into_iter()
        .filter(|members| members.len() >= 2)
        .map(|members| {
            for &idx in &members {
                claimed[idx] = true;
            }
            let members = members.iter().map(|&idx| contacts[idx].clone()).collect();
            DuplicateGroup::new(members, match_type)
        })
        .collect()
}

/// Greedy clustering: each unclaimed contact absorbs every later unclaimed
/// contact whose name is within `MAX_NAME_DISTANCE` of its own. Members are
/// compared to the cluster's first contact only, not to each other.
fn cluster_by_name(contacts: &[Contact], claimed: &mut [bool]) -> Vec<DuplicateGroup> {
    let names: Vec<(String, usize)> = contacts
        .iter()
        .map(|c| {
            let name = normalize_name(&c.first_name, &c.last_name);
            let len = name.chars().count();
            (name, len)
        })
        .collect();

    let mut groups = Vec::new();

    for i in 0..contacts.len() {
        if claimed[i] || names[i].1 < MIN_NAME_LENGTH {
            continue;
        }

        let mut cluster = vec![i];
        for j in (i + 1)..contacts.len() {
            if claimed[j] || names[j].1 < MIN_NAME_LENGTH {
                continue;
            }
            if names_match(&names[i], &names[j]) {
                claimed[j] = true;
                cluster.push(j);
            }
        }

        if cluster.len() >= 2 {
            claimed[i] = true;
            let members = cluster.iter().map(|&idx| contacts[idx].clone()).collect();
            groups.push(DuplicateGroup::new(members, MatchType::Name));
        }
    }

    groups
}

fn names_match((a, a_len): &(String, usize), (b, b_len): &(String, usize)) -> bool {
    let distance = levenshtein_distance(a, b);
    // Very short names sit within a couple of edits of each other by chance.
    distance <= MAX_NAME_DISTANCE && distance < (*a_len).min(*b_len)
}
