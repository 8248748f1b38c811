//! Collision policies

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// What to do when the destination of a create/rename/move/copy is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Place the new entry under a generated free name.
    GenerateUniqueName,
    /// Delete the occupant, then proceed.
    ReplaceExisting,
    /// Return a collision failure.
    #[default]
    FailIfExists,
    /// Return a fatal collision error.
    ThrowIfExists,
    /// Hand back the occupant instead of performing the operation.
    OpenIfExists,
    /// Move the occupant aside to a generated free name, then proceed.
    GenerateUniqueNameForExisting,
}

impl CollisionPolicy {
    pub const ALL: [CollisionPolicy; 6] = [
        CollisionPolicy::GenerateUniqueName,
        CollisionPolicy::ReplaceExisting,
        CollisionPolicy::FailIfExists,
        CollisionPolicy::ThrowIfExists,
        CollisionPolicy::OpenIfExists,
        CollisionPolicy::GenerateUniqueNameForExisting,
    ];

    /// Whether the collision resolver is involved.
    pub fn generates_names(self) -> bool {
        matches!(
            self,
            CollisionPolicy::GenerateUniqueName | CollisionPolicy::GenerateUniqueNameForExisting
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollisionPolicy::GenerateUniqueName => "generate_unique_name",
            CollisionPolicy::ReplaceExisting => "replace_existing",
            CollisionPolicy::FailIfExists => "fail_if_exists",
            CollisionPolicy::ThrowIfExists => "throw_if_exists",
            CollisionPolicy::OpenIfExists => "open_if_exists",
            CollisionPolicy::GenerateUniqueNameForExisting => "generate_unique_name_for_existing",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        CollisionPolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("Unknown collision policy: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_names() {
        for policy in CollisionPolicy::ALL {
            assert_eq!(policy.as_str().parse::<CollisionPolicy>(), Ok(policy));
        }
        assert_eq!(
            "Replace-Existing".parse::<CollisionPolicy>(),
            Ok(CollisionPolicy::ReplaceExisting)
        );
        assert!("overwrite".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn test_only_generating_policies_use_resolver() {
        let generating: Vec<_> = CollisionPolicy::ALL
            .into_iter()
            .filter(|p| p.generates_names())
            .collect();
        assert_eq!(
            generating,
            vec![
                CollisionPolicy::GenerateUniqueName,
                CollisionPolicy::GenerateUniqueNameForExisting
            ]
        );
    }
}
