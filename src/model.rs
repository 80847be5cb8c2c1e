//! Rows of the four entities served by the API, plus the subscription join rows.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberTypeId {
    Basic,
    Business,
}

impl fmt::Display for MemberTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberTypeId::Basic => f.write_str("basic"),
            MemberTypeId::Business => f.write_str("business"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberType {
    pub id: MemberTypeId,
    pub discount: f64,
    pub posts_limit_per_month: i32,
}

/// `subscriber_id` follows the posts of `author_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscriber_id: Uuid,
    pub author_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_type_id_displays_lowercase() {
        assert_eq!(MemberTypeId::Basic.to_string(), "basic");
        assert_eq!(MemberTypeId::Business.to_string(), "business");
    }
}
