//! Verified bearer-token claims.

use serde::{Deserialize, Serialize};

use crate::GroupId;

/// Claims carried by a token issued by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Caller identity. Issued as a string or a number; always a string here.
    #[serde(deserialize_with = "crate::de::string_or_number")]
    pub sub: String,

    /// Groups the caller is a member of.
    #[serde(default)]
    pub gids: Vec<GroupId>,

    /// Expiry (seconds since the epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    /// Whether the caller belongs to `group_id`.
    pub fn is_member(&self, group_id: GroupId) -> bool {
        self.gids.contains(&group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_sub_is_normalized() {
        let claims: Claims =
            serde_json::from_value(serde_json::json!({"sub": 42, "gids": [1, 2]})).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.is_member(2));
        assert!(!claims.is_member(3));
    }

    #[test]
    fn test_missing_gids_defaults_to_empty() {
        let claims: Claims = serde_json::from_value(serde_json::json!({"sub": "u1"})).unwrap();
        assert!(claims.gids.is_empty());
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_sub_must_be_scalar() {
        let result: Result<Claims, _> = serde_json::from_value(serde_json::json!({"sub": [1]}));
        assert!(result.is_err());
    }
}
