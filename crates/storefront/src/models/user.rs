//! User profile types.
//!
//! Identity comes from the external auth service; this is the profile
//! record it hands the session. The session core only reads it and
//! applies partial profile edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{Email, UserId};

/// A signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity from the auth service.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    /// When the account was created.
    pub join_date: DateTime<Utc>,
}

/// A partial profile edit; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl User {
    /// Merge a partial edit into the profile.
    pub fn apply(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            first_name,
            last_name,
            phone,
            address,
            city,
            state,
            pincode,
        } = update;
        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(city) = city {
            self.city = city;
        }
        if let Some(state) = state {
            self.state = state;
        }
        if let Some(pincode) = pincode {
            self.pincode = pincode;
        }
    }

    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
