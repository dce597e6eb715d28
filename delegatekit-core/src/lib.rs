//! Authorization core for delegated smart accounts.
//!
//! A [`DelegateAccount`] is controlled by one owner, can be handed to a successor by a
//! threshold of guardians, may let an approved sponsor execute on its behalf, and
//! caps the value it sends per day. A [`WalletFactory`] creates accounts at
//! deterministic CREATE2 addresses and refuses to create the same one twice.
//!
//! The platform (outbound calls, the clock, rollback) is abstracted by [`Host`];
//! [`InMemoryHost`] is the reference implementation used by the tests and the CLI.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod account;
pub use account::{DelegateAccount, DEFAULT_RECOVERY_THRESHOLD};

pub mod config;
pub use config::{AccountConfig, BatchPolicy, FactoryConfig, SaltStrategy};

pub mod context;
pub use context::{AuthPolicy, CallContext, Role};

/// Error and result types shared by every entry point.
pub mod error;
pub use error::{AccountError, AccountResult};

pub mod events;
pub use events::{AccountEvent, FactoryEvent};

pub mod factory;
pub use factory::{WalletFactory, WalletParams};

pub mod host;
pub use host::{Call, CallOutcome, Host, InMemoryHost};

/// Bridge from the `log` facade to a host-provided logger.
pub mod logger;

pub mod shared;
pub use shared::SharedAccount;

pub mod signature;
pub mod upgrade;
pub use upgrade::{LogicPointer, LogicRegistry};

// building blocks used by the account
pub mod guardians;
pub mod recovery;
pub mod spending;

uniffi::setup_scaffolding!("delegatekit_core");
