//! Account and factory configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{context::AuthPolicy, error::AccountResult};

/// Logic version an instance accepts when its logic pointer is swapped.
pub const DEFAULT_LOGIC_VERSION: &str = "2.0.0";

/// What `execute_batch` does when one of its calls fails.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// The first failing call aborts and rolls back the whole batch.
    #[default]
    Strict,
    /// Every call is attempted; failures are reported per index.
    BestEffort,
}

/// How the factory obtains the CREATE2 salt for a deployment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaltStrategy {
    /// The caller passes the salt explicitly.
    #[default]
    CallerSupplied,
    /// The salt is derived from the caller and the caller's running nonce.
    AutoDerived,
}

/// Per-instance behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Which identity the owner-or-self guard compares against the owner.
    pub auth_policy: AuthPolicy,
    /// Abort policy for batch execution.
    pub batch_policy: BatchPolicy,
    /// Require the attached value to equal the declared value of every execution.
    pub value_tracking: bool,
    /// Version tag a new logic target must declare.
    pub expected_logic_version: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            auth_policy: AuthPolicy::default(),
            batch_policy: BatchPolicy::default(),
            value_tracking: true,
            expected_logic_version: DEFAULT_LOGIC_VERSION.to_string(),
        }
    }
}

impl AccountConfig {
    /// Parses an account configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `AccountError::InvalidConfig` if the document is not valid.
    pub fn from_json(json: &str) -> AccountResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Factory-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Salt strategy used by every deployment of this factory.
    pub salt_strategy: SaltStrategy,
    /// Configuration handed to every instance the factory creates.
    pub account: AccountConfig,
}

impl FactoryConfig {
    /// Parses a factory configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `AccountError::InvalidConfig` if the document is not valid.
    pub fn from_json(json: &str) -> AccountResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
