//! Logic-swap bookkeeping: the version table and the per-instance logic pointer.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// Logic target an instance currently runs, with its declared version tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicPointer {
    /// Address of the logic target.
    pub implementation: Address,
    /// Version tag the logic target declares.
    pub version: String,
}

/// Table of known logic targets and the version each one declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicRegistry {
    versions: HashMap<Address, String>,
}

impl LogicRegistry {
    /// Registers `implementation` as declaring `version`, replacing any previous entry.
    pub fn register(&mut self, implementation: Address, version: impl Into<String>) {
        self.versions.insert(implementation, version.into());
    }

    /// Version declared by `implementation`.
    #[must_use]
    pub fn version_of(&self, implementation: &Address) -> Option<&str> {
        self.versions.get(implementation).map(String::as_str)
    }

    /// Resolves `implementation` to a pointer, requiring it to declare `expected`.
    ///
    /// # Errors
    /// - `InvalidArgument` if `implementation` is zero, is `instance` itself, or is not
    ///   registered.
    /// - `VersionMismatch` if it declares a different version.
    pub fn resolve(
        &self,
        instance: Address,
        implementation: Address,
        expected: &str,
    ) -> AccountResult<LogicPointer> {
        if implementation.is_zero() {
            return Err(AccountError::invalid("implementation", "zero address"));
        }
        if implementation == instance {
            return Err(AccountError::invalid(
                "implementation",
                "cannot point an instance at itself",
            ));
        }
        let version = self.version_of(&implementation).ok_or_else(|| {
            AccountError::invalid("implementation", format!("{implementation} is not registered"))
        })?;
        if version != expected {
            return Err(AccountError::VersionMismatch {
                expected: expected.to_string(),
                found: version.to_string(),
            });
        }
        Ok(LogicPointer {
            implementation,
            version: version.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_resolve_pins_version() {
        let mut registry = LogicRegistry::default();
        registry.register(id(2), "2.0.0");
        registry.register(id(3), "1.0.0");

        let pointer = registry.resolve(id(1), id(2), "2.0.0").unwrap();
        assert_eq!(pointer.implementation, id(2));
        assert_eq!(pointer.version, "2.0.0");

        assert_eq!(
            registry.resolve(id(1), id(3), "2.0.0").unwrap_err(),
            AccountError::VersionMismatch {
                expected: "2.0.0".to_string(),
                found: "1.0.0".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_rejects_bad_targets() {
        let mut registry = LogicRegistry::default();
        registry.register(id(1), "2.0.0");

        for target in [Address::ZERO, id(1), id(4)] {
            assert!(matches!(
                registry.resolve(id(1), target, "2.0.0"),
                Err(AccountError::InvalidArgument { .. })
            ));
        }
    }
}
