use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::principal::Principal;

/// Stored todo. `id`, `owner` and `created_at` are fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: String,
    pub owner: Principal,
    pub title: String,
    pub body: String,
    pub tag: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Caller-supplied fields for create/update. Server-side fields are not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tag: String,
}

impl TodoPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), tag: tag.into() }
    }

    /// Title is checked before body; tag may be empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.title.is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        if self.body.is_empty() {
            return Err(ModelError::EmptyBody);
        }
        Ok(())
    }
}

impl TodoRecord {
    /// Build a fresh record owned by `owner`. The payload must already be validated.
    pub fn new(id: String, owner: Principal, payload: TodoPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            title: payload.title,
            body: payload.body,
            tag: payload.tag,
            completed: false,
            created_at: now,
            updated_at: None,
        }
    }

    /// Overwrite the mutable fields from a payload and stamp `updated_at`.
    pub fn apply(&mut self, payload: TodoPayload, now: DateTime<Utc>) {
        self.title = payload.title;
        self.body = payload.body;
        self.tag = payload.tag;
        self.updated_at = Some(now);
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.updated_at = Some(now);
    }

    pub fn is_owned_by(&self, caller: &Principal) -> bool {
        &self.owner == caller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn validate_rejects_empty_title_first() {
        assert_eq!(TodoPayload::new("", "", "").validate(), Err(ModelError::EmptyTitle));
        assert_eq!(TodoPayload::new("t", "", "x").validate(), Err(ModelError::EmptyBody));
        assert_eq!(TodoPayload::new("t", "b", "").validate(), Ok(()));
    }

    #[test]
    fn whitespace_is_not_empty() {
        assert!(TodoPayload::new(" ", " ", "").validate().is_ok());
    }

    #[test]
    fn apply_keeps_provenance_and_completion() {
        let mut rec = TodoRecord::new("id-1".into(), "p1".into(), TodoPayload::new("a", "b", "x"), ts(10));
        rec.mark_completed(ts(20));
        rec.apply(TodoPayload::new("c", "d", ""), ts(30));

        assert_eq!(rec.id, "id-1");
        assert_eq!(rec.owner, Principal::from("p1"));
        assert_eq!(rec.created_at, ts(10));
        assert_eq!(rec.updated_at, Some(ts(30)));
        assert!(rec.completed);
        assert_eq!((rec.title.as_str(), rec.body.as_str(), rec.tag.as_str()), ("c", "d", ""));
    }

    #[test]
    fn payload_tag_defaults_to_empty() {
        let p: TodoPayload = serde_json::from_str(r#"{"title":"a","body":"b"}"#).unwrap();
        assert_eq!(p.tag, "");
    }
}
