use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user record.
///
/// `id` is `None` until the repository persists the user for the first time.
/// `created_at`/`updated_at` are owned by the repository: values supplied by
/// callers are ignored on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub login_name: String,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// A user that has not been persisted yet.
    pub fn new(
        login_name: impl Into<String>,
        email_address: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self::builder()
            .login_name(login_name)
            .email_address(email_address)
            .first_name(first_name)
            .last_name(last_name)
            .build()
    }

    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Start a builder pre-filled with this user's fields.
    pub fn to_builder(&self) -> UserBuilder {
        UserBuilder {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            login_name: self.login_name.clone(),
            email_address: self.email_address.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Default, Clone)]
pub struct UserBuilder {
    id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    login_name: String,
    email_address: String,
    first_name: String,
    last_name: String,
}

impl UserBuilder {
    pub fn id(mut self, id: impl Into<Option<i64>>) -> Self {
        self.id = id.into();
        self
    }

    pub fn created_at(mut self, created_at: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.created_at = created_at.into();
        self
    }

    pub fn updated_at(mut self, updated_at: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.updated_at = updated_at.into();
        self
    }

    pub fn login_name(mut self, login_name: impl Into<String>) -> Self {
        self.login_name = login_name.into();
        self
    }

    pub fn email_address(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = email_address.into();
        self
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = last_name.into();
        self
    }

    pub fn build(self) -> User {
        User {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            login_name: self.login_name,
            email_address: self.email_address,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}
