//! Authorization for mutating commands.
//!
//! Group owners and admins may manage their group's knowledge base; root
//! users may manage any group and flip the on/off switch.

use qa_common::config::AuthConfig;
use std::collections::HashSet;

pub trait AuthorizationPolicy: Send + Sync {
    /// May add or delete entries
    fn is_authorized(&self, role: &str, user_id: &str) -> bool;

    /// May toggle the knowledge base
    fn is_root(&self, user_id: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    root_users: HashSet<String>,
}

impl RolePolicy {
    pub fn new<I, S>(root_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root_users: root_users.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.root_users.iter().cloned())
    }
}

impl AuthorizationPolicy for RolePolicy {
    fn is_authorized(&self, role: &str, user_id: &str) -> bool {
        matches!(role, "owner" | "admin") || self.is_root(user_id)
    }

    fn is_root(&self, user_id: &str) -> bool {
        self.root_users.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        let policy = RolePolicy::new(["10001"]);
        assert!(policy.is_authorized("owner", "20002"));
        assert!(policy.is_authorized("admin", "20002"));
        assert!(!policy.is_authorized("member", "20002"));
        assert!(policy.is_authorized("member", "10001"));
    }

    #[test]
    fn test_root_only_from_config() {
        let policy = RolePolicy::from_config(&AuthConfig {
            root_users: vec!["10001".to_string()],
        });
        assert!(policy.is_root("10001"));
        assert!(!policy.is_root("20002"));
        assert!(!RolePolicy::default().is_root("10001"));
    }
}
