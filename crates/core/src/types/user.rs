//! User records and the request bodies that create or change them.

use serde::{Deserialize, Serialize};

use super::{Email, UserId, ValidationError, require};

/// A user as returned by `GET /users` and `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub company: Company,
}

/// Postal address of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    #[serde(default)]
    pub geo: Geo,
}

/// Coordinates, kept as the strings the API sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

/// Employer of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub catch_phrase: String,
    #[serde(default)]
    pub bs: String,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl CreateUserRequest {
    /// Check the fields the API requires before sending.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field, or an invalid email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("username", &self.username)?;
        require("email", &self.email)?;
        Email::parse(&self.email)?;
        Ok(())
    }
}

/// Body of `PUT`/`PATCH /users/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

impl UpdateUserRequest {
    /// Overlay the present fields onto `user`.
    #[must_use]
    pub fn apply_to(&self, user: &User) -> User {
        let mut merged = user.clone();
        if let Some(name) = &self.name {
            merged.name.clone_from(name);
        }
        if let Some(username) = &self.username {
            merged.username.clone_from(username);
        }
        if let Some(email) = &self.email {
            merged.email.clone_from(email);
        }
        if let Some(phone) = &self.phone {
            merged.phone.clone_from(phone);
        }
        if let Some(website) = &self.website {
            merged.website.clone_from(website);
        }
        if let Some(address) = &self.address {
            merged.address = address.clone();
        }
        if let Some(company) = &self.company {
            merged.company = company.clone();
        }
        merged
    }

    /// Whether the request would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.address.is_none()
            && self.company.is_none()
    }
}
