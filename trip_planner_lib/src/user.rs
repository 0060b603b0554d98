use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Regular,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Regular => "regular",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<UserRole> {
        match value {
            "regular" => Some(UserRole::Regular),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Full account record. Only the data layer sees the password hash.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub join_date: DateTime<Utc>,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let role: String = row.get(4);
        let role = UserRole::parse(&role)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown user role: {role}").into()))?;

        Ok(Self {
            user_id: row.get(0),
            name: row.get(1),
            email: row.get(2),
            password_hash: row.get(3),
            role,
            join_date: row.get(5),
        })
    }
}

impl User {
    pub fn new(user_id: i64, name: String, email: String, password_hash: String, role: UserRole, join_date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name,
            email,
            password_hash,
            role,
            join_date,
        }
    }

    pub fn public(&self) -> UserPublic {
        UserPublic {
            user_id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Identity handle threaded into every access-control call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserPublic {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
