use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::list::{ListRecord, SortKey};
use crate::query::ListFields;

/// The two account collections served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Toko,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Toko => "toko",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        self.as_str()
    }

    /// Singular label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::Toko => "toko",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" => Ok(Collection::Users),
            "toko" => Ok(Collection::Toko),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

/// A stored account (a user or a toko).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never serialized to clients.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListRecord for Account {
    const LIST_FIELDS: ListFields = ListFields {
        search: &["name", "email"],
        sortable: &["name", "email", "created_at", "updated_at"],
        default_sort: "name",
    };

    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "name" => SortKey::Text(self.name.clone()),
            "email" => SortKey::Text(self.email.clone()),
            "created_at" => SortKey::Time(self.created_at),
            "updated_at" => SortKey::Time(self.updated_at),
            _ => SortKey::Missing,
        }
    }
}

/// DTO for inserting a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Mutable profile fields of an account.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub name: String,
    pub email: String,
}

/// Unique fields an account can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    Email,
}

impl LookupField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupField::Email => "email",
        }
    }
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
