use serde::{Deserialize, Serialize};

/// Role carried by an identity token.
///
/// `admin`, `manager` and `agent` are staff roles produced by the identity
/// layer; customer-facing connections carry `customer`. Ordering is
/// `Customer < Agent < Manager < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Agent,
    Manager,
    Admin,
}

impl Role {
    /// Whether this role grants at least the privileges of `other`.
    pub fn is_at_least(&self, other: Role) -> bool {
        *self >= other
    }
}

/// Verified identity bound to a connection for its entire lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub company_id: String,
    pub branch_id: String,
}

impl Identity {
    /// Identity used when verification is disabled and no token was sent.
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            role: Role::Admin,
            company_id: String::new(),
            branch_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering() {
        assert!(Role::Admin.is_at_least(Role::Agent));
        assert!(Role::Manager.is_at_least(Role::Agent));
        assert!(Role::Agent.is_at_least(Role::Agent));
        assert!(!Role::Customer.is_at_least(Role::Agent));
        assert!(!Role::Manager.is_at_least(Role::Admin));
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Agent).unwrap(), "\"agent\"");
        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn identity_round_trip() {
        let identity = Identity {
            user_id: "u-17".to_string(),
            role: Role::Agent,
            company_id: "acme".to_string(),
            branch_id: "downtown".to_string(),
        };
        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}
