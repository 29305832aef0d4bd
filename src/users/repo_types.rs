use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,                   // assigned by the store, immutable
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, never exposed in JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields handed to a store when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
}

impl NewUser {
    /// Builds the stored record, stamping a fresh id and creation time.
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_omits_password_hash() {
        let record = NewUser {
            username: "alice".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            email: Some("alice@example.com".into()),
        }
        .into_record();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("id").is_some());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn missing_email_is_not_serialized() {
        let record = NewUser {
            username: "bob".into(),
            password_hash: "h".into(),
            email: None,
        }
        .into_record();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("email").is_none());
    }
}
