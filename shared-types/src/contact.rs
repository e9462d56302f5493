use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Qualitative label paired with a contact's numeric lead score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    #[default]
    Cold,
    Warm,
    Hot,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Cold => "cold",
            LeadStatus::Warm => "warm",
            LeadStatus::Hot => "hot",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "hot" => LeadStatus::Hot,
            "warm" => LeadStatus::Warm,
            _ => LeadStatus::Cold,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub company_id: Option<String>,
    pub job_title: Option<String>,
    pub lead_source: Option<String>,
    pub owner_agent_id: Option<String>,
    pub notes: Option<String>,
    pub last_contacted_at: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    pub lead_score: i32,
    pub lead_status: LeadStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Score and label travel together so a patch can never set one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadRating {
    pub score: i32,
    pub status: LeadStatus,
}

/// Partial update of a contact. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, unknown> | null")]
    pub custom_fields: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadRating>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        *self == ContactPatch::default()
    }

    /// Writes every set field onto `contact`.
    pub fn apply_to(&self, contact: &mut Contact) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut contact.email, &self.email);
        set(&mut contact.phone, &self.phone);
        set(&mut contact.avatar_url, &self.avatar_url);
        set(&mut contact.company_id, &self.company_id);
        set(&mut contact.job_title, &self.job_title);
        set(&mut contact.lead_source, &self.lead_source);
        set(&mut contact.owner_agent_id, &self.owner_agent_id);
        set(&mut contact.notes, &self.notes);
        set(&mut contact.last_contacted_at, &self.last_contacted_at);

        if let Some(tags) = &self.tags {
            contact.tags = tags.clone();
        }
        if let Some(custom_fields) = &self.custom_fields {
            contact.custom_fields = custom_fields.clone();
        }
        if let Some(lead) = self.lead {
            contact.lead_score = lead.score;
            contact.lead_status = lead.status;
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        let patch = ContactPatch::default();
        assert!(patch.is_empty());
        assert_eq!(serde_json::to_string(&patch).unwrap(), "{}");
    }

    #[test]
    fn test_apply_patch_sets_only_present_fields() {
        let mut contact = Contact {
            id: "c1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };

        let patch = ContactPatch {
            phone: Some("555-0100".to_string()),
            tags: Some(vec!["vip".to_string()]),
            lead: Some(LeadRating {
                score: 80,
                status: LeadStatus::Hot,
            }),
            ..Default::default()
        };
        patch.apply_to(&mut contact);

        assert_eq!(contact.email.as_deref(), Some("ada@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("555-0100"));
        assert_eq!(contact.tags, vec!["vip".to_string()]);
        assert_eq!(contact.lead_score, 80);
        assert_eq!(contact.lead_status, LeadStatus::Hot);
    }

    #[test]
    fn test_lead_status_serialization() {
        let json = serde_json::to_string(&LeadStatus::Warm).unwrap();
        assert_eq!(json, "\"warm\"");
        assert_eq!(LeadStatus::parse("hot"), LeadStatus::Hot);
        assert_eq!(LeadStatus::parse("unknown"), LeadStatus::Cold);
    }
}
