use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::Specialty;
use crate::backend::{Document, Fields};

pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,                   // store-assigned id
    pub name: String,
    pub email: String,                // lookup key, not unique in the store
    #[serde(skip_serializing)]
    pub password: String,             // stored as entered, never exposed in JSON
    pub age: u8,
    pub specialty: Specialty,
    #[serde(default)]
    pub profile_image: String,        // public URL or empty
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl UserRecord {
    pub fn from_document(doc: Document) -> anyhow::Result<Self> {
        let Document { id, mut fields } = doc;
        fields.insert("id".into(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields))
            .with_context(|| format!("decode user document {id}"))
    }
}

/// Field set written when a user registers.
#[derive(Debug, Serialize)]
pub(crate) struct NewUserDocument<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub age: u8,
    pub specialty: Specialty,
    pub profile_image: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Registration input. `age` stays textual until the container parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub specialty: Specialty,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<Specialty>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none() && self.specialty.is_none()
    }

    pub fn to_fields(&self) -> anyhow::Result<Fields> {
        to_fields(self)
    }

    pub fn apply_to(&self, user: &mut UserRecord) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(specialty) = self.specialty {
            user.specialty = specialty;
        }
    }
}

/// Parse a textual age, accepting only integers in `MIN_AGE..=MAX_AGE`.
pub fn parse_age(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
}

pub(crate) fn to_fields<T: Serialize>(value: &T) -> anyhow::Result<Fields> {
    match serde_json::to_value(value).context("serialize document")? {
        Value::Object(fields) => Ok(fields),
        other => anyhow::bail!("expected an object, got {other}"),
    }
}

pub(crate) fn timestamp_value(at: OffsetDateTime) -> anyhow::Result<Value> {
    let formatted = at
        .format(&time::format_description::well_known::Rfc3339)
        .context("format timestamp")?;
    Ok(Value::String(formatted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn sample() -> UserRecord {
        UserRecord {
            id: "u1".into(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
            age: 22,
            specialty: Specialty::Software,
            profile_image: String::new(),
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: None,
        }
    }

    #[test]
    fn parse_age_bounds() {
        assert_eq!(parse_age("1"), Some(1));
        assert_eq!(parse_age(" 120 "), Some(120));
        assert_eq!(parse_age("0"), None);
        assert_eq!(parse_age("121"), None);
        assert_eq!(parse_age("-3"), None);
        assert_eq!(parse_age("22abc"), None);
        assert_eq!(parse_age(""), None);
    }

    #[test]
    fn decodes_document_written_at_registration() {
        let created_at = datetime!(2024-05-01 10:00 UTC);
        let fields = to_fields(&NewUserDocument {
            name: "Ana",
            email: "ana@x.com",
            password: "secret1",
            age: 22,
            specialty: Specialty::Software,
            profile_image: "",
            created_at,
        })
        .unwrap();
        let user = UserRecord::from_document(Document {
            id: "u1".into(),
            fields,
        })
        .unwrap();
        assert_eq!(user, sample());
    }

    #[test]
    fn json_view_hides_password() {
        let v = serde_json::to_value(sample()).unwrap();
        assert!(v.get("password").is_none());
        assert_eq!(v["specialty"], json!("software"));
        assert_eq!(v["created_at"], json!("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let patch = ProfilePatch {
            age: Some(23),
            ..ProfilePatch::default()
        };
        let fields = patch.to_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["age"], json!(23));

        let mut user = sample();
        patch.apply_to(&mut user);
        assert_eq!(user.age, 23);
        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@x.com");
        assert!(ProfilePatch::default().is_empty());
    }

    #[test]
    fn bad_document_fails_to_decode() {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Ana"));
        let err = UserRecord::from_document(Document {
            id: "u9".into(),
            fields,
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("u9"));
    }
}
