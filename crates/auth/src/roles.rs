use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of account roles.
///
/// There is no hierarchy: `Admin` does not imply `Staff` or `User`. Every
/// protected operation lists each role it admits in its own [`RoleSet`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    Staff,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Staff, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::User => "User",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Staff => 0b010,
            Role::User => 0b100,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Staff" => Ok(Role::Staff),
            "User" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Explicit set of roles admitted by one protected operation.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct RoleSet {
    bits: u8,
}

impl RoleSet {
    /// Every role. Used by operations open to any authenticated caller.
    pub const ANY: RoleSet = RoleSet::of(&Role::ALL);

    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        Self { bits }
    }

    pub const fn with(self, role: Role) -> Self {
        Self {
            bits: self.bits | role.bit(),
        }
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.bits & role.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl core::fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::empty(), RoleSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_exact() {
        let admin_only = RoleSet::of(&[Role::Admin]);
        assert!(admin_only.contains(Role::Admin));
        assert!(!admin_only.contains(Role::Staff));
        assert!(!admin_only.contains(Role::User));

        let user_only = RoleSet::of(&[Role::User]);
        assert!(!user_only.contains(Role::Admin));
    }

    #[test]
    fn any_contains_every_role() {
        for role in Role::ALL {
            assert!(RoleSet::ANY.contains(role));
        }
        assert!(RoleSet::empty().is_empty());
    }

    #[test]
    fn collects_from_iterator() {
        let set: RoleSet = [Role::Staff, Role::User].into_iter().collect();
        assert_eq!(set, RoleSet::of(&[Role::User, Role::Staff]));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Role::Staff, Role::User]);
    }

    #[test]
    fn parses_and_serializes_canonical_names() {
        assert_eq!("Staff".parse::<Role>().unwrap(), Role::Staff);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
    }
}
