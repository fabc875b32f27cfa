//! Who may use a command or module.

use serde::{Deserialize, Serialize};

use crate::interaction::Interaction;

/// Access rules for a command or module.
///
/// Deny lists win over allow lists. Empty allow lists allow everyone.
///
/// # Examples
///
/// ```
/// use command_manual_dispatch::Permissions;
///
/// let admins_only: Permissions = serde_json::from_str(r#"{"allowed_roles": [42]}"#).unwrap();
/// assert_eq!(admins_only.allowed_roles, vec![42]);
/// assert!(admins_only.denied_users.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    /// Users allowed regardless of roles.
    pub allowed_users: Vec<u64>,
    /// Roles whose holders are allowed.
    pub allowed_roles: Vec<u64>,
    pub denied_users: Vec<u64>,
    pub denied_roles: Vec<u64>,
    /// Guilds the rules apply in; empty means every guild.
    pub guilds: Vec<u64>,
}

impl Permissions {
    /// Allows only the listed users.
    pub fn users(users: impl IntoIterator<Item = u64>) -> Self {
        Self {
            allowed_users: users.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Allows only holders of the listed roles.
    pub fn roles(roles: impl IntoIterator<Item = u64>) -> Self {
        Self {
            allowed_roles: roles.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn allows(&self, interaction: &dyn Interaction) -> bool {
        let author = interaction.author_id();
        let roles = interaction.role_ids();

        if !self.guilds.is_empty()
            && !interaction
                .guild_id()
                .is_some_and(|guild| self.guilds.contains(&guild))
        {
            return false;
        }
        if self.denied_users.contains(&author) || roles.iter().any(|r| self.denied_roles.contains(r)) {
            return false;
        }
        if self.allowed_users.is_empty() && self.allowed_roles.is_empty() {
            return true;
        }
        self.allowed_users.contains(&author) || roles.iter().any(|r| self.allowed_roles.contains(r))
    }
}

/// Unrestricted when `permissions` is `None`.
pub fn allowed(interaction: &dyn Interaction, permissions: Option<&Permissions>) -> bool {
    permissions.is_none_or(|p| p.allows(interaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct Caller {
        author: u64,
        guild: Option<u64>,
        roles: Vec<u64>,
    }

    impl Interaction for Caller {
        fn author_id(&self) -> u64 {
            self.author
        }
        fn guild_id(&self) -> Option<u64> {
            self.guild
        }
        fn role_ids(&self) -> &[u64] {
            &self.roles
        }
        fn content(&self) -> &str {
            ""
        }
        fn reply(&self, _text: &str) -> Result<()> {
            Ok(())
        }
        fn give_check(&self) -> bool {
            true
        }
    }

    fn caller(author: u64, roles: &[u64]) -> Caller {
        Caller {
            author,
            guild: Some(7),
            roles: roles.to_vec(),
        }
    }

    #[test]
    fn test_no_permissions_allows_everyone() {
        assert!(allowed(&caller(1, &[]), None));
        assert!(allowed(&caller(1, &[]), Some(&Permissions::default())));
    }

    #[test]
    fn test_allow_lists() {
        let by_user = Permissions::users([1]);
        assert!(by_user.allows(&caller(1, &[])));
        assert!(!by_user.allows(&caller(2, &[])));

        let by_role = Permissions::roles([10]);
        assert!(by_role.allows(&caller(2, &[10, 11])));
        assert!(!by_role.allows(&caller(2, &[11])));
    }

    #[test]
    fn test_deny_wins() {
        let permissions = Permissions {
            allowed_roles: vec![10],
            denied_users: vec![3],
            ..Permissions::default()
        };
        assert!(!permissions.allows(&caller(3, &[10])));

        let permissions = Permissions {
            denied_roles: vec![66],
            ..Permissions::default()
        };
        assert!(!permissions.allows(&caller(4, &[66])));
        assert!(permissions.allows(&caller(4, &[])));
    }

    #[test]
    fn test_guild_restriction() {
        let permissions = Permissions {
            guilds: vec![8],
            ..Permissions::default()
        };
        assert!(!permissions.allows(&caller(1, &[])));
        let elsewhere = Caller {
            author: 1,
            guild: Some(8),
            roles: Vec::new(),
        };
        assert!(permissions.allows(&elsewhere));
    }
}
