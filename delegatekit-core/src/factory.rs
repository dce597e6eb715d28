//! Deterministic, deduplicated creation of delegate accounts from a shared template.
//!
//! An instance's address is the CREATE2 address of the factory for the deployment
//! salt and the hash of the instance's init code: an EIP-1167 minimal proxy pointing
//! at the template, followed by the ABI-encoded creation parameters. Prediction and
//! creation share [`WalletFactory::predict_wallet_address`], so they always agree.

use std::collections::{BTreeMap, HashMap};

use alloy_core::sol_types::SolValue;
use alloy_primitives::{keccak256, Address, B256, U256};

use crate::{
    account::DelegateAccount,
    config::{FactoryConfig, SaltStrategy},
    context::CallContext,
    error::{AccountError, AccountResult},
    events::FactoryEvent,
};

/// EIP-1167 creation code up to the embedded implementation address.
const PROXY_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d,
    0x3d, 0x3d, 0x36, 0x3d, 0x73,
];

/// EIP-1167 creation code after the embedded implementation address.
const PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Creation parameters of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletParams {
    /// Owner set. The first owner becomes the instance's primary owner.
    pub owners: Vec<Address>,
    /// Guardian set.
    pub guardians: Vec<Address>,
    /// Recovery threshold.
    pub threshold: usize,
}

impl WalletParams {
    /// Checks `|guardians| >= threshold > 0`, at least one owner, and no zero entries.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first violated rule.
    pub fn validate(&self) -> AccountResult<()> {
        if self.owners.is_empty() {
            return Err(AccountError::invalid("owners", "at least one owner required"));
        }
        if self.owners.iter().any(|a| a.is_zero()) {
            return Err(AccountError::invalid("owners", "zero address"));
        }
        if self.guardians.iter().any(|a| a.is_zero()) {
            return Err(AccountError::invalid("guardians", "zero address"));
        }
        if self.threshold == 0 {
            return Err(AccountError::invalid("threshold", "must be positive"));
        }
        if self.guardians.len() < self.threshold {
            return Err(AccountError::invalid(
                "threshold",
                format!(
                    "{} exceeds guardian count {}",
                    self.threshold,
                    self.guardians.len()
                ),
            ));
        }
        Ok(())
    }

    /// Duplicate-detection key: `keccak256(abi.encode(owners, guardians, threshold, salt))`.
    #[must_use]
    pub fn derive_key(&self, salt: B256) -> B256 {
        keccak256(
            (
                self.owners.clone(),
                self.guardians.clone(),
                U256::from(self.threshold),
                salt,
            )
                .abi_encode(),
        )
    }

    fn constructor_args(&self) -> Vec<u8> {
        (
            self.owners.clone(),
            self.guardians.clone(),
            U256::from(self.threshold),
        )
            .abi_encode_params()
    }
}

/// Init code of an instance: the minimal proxy for `template` followed by the
/// ABI-encoded creation parameters.
#[must_use]
pub fn init_code(template: Address, params: &WalletParams) -> Vec<u8> {
    let args = params.constructor_args();
    let mut code =
        Vec::with_capacity(PROXY_PREFIX.len() + 20 + PROXY_SUFFIX.len() + args.len());
    code.extend_from_slice(&PROXY_PREFIX);
    code.extend_from_slice(template.as_slice());
    code.extend_from_slice(&PROXY_SUFFIX);
    code.extend_from_slice(&args);
    code
}

/// CREATE2 address for `factory`, `salt` and `init_code`.
#[must_use]
pub fn create2_address(factory: Address, salt: B256, init_code: &[u8]) -> Address {
    factory.create2_from_code(salt, init_code)
}

/// Record of one created instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Address of the instance.
    pub address: Address,
    /// Salt used.
    pub salt: B256,
    /// Creation parameters.
    pub params: WalletParams,
}

/// Factory creating delegate accounts from one template.
#[derive(Debug)]
pub struct WalletFactory {
    address: Address,
    template: Address,
    config: FactoryConfig,
    deployed: HashMap<B256, Deployment>,
    nonces: HashMap<Address, u64>,
    wallets: BTreeMap<Address, DelegateAccount>,
    events: Vec<FactoryEvent>,
}

impl WalletFactory {
    /// Creates a factory at `address` instantiating `template`.
    ///
    /// # Errors
    /// `InvalidArgument` if either address is zero.
    pub fn new(
        address: Address,
        template: Address,
        config: FactoryConfig,
    ) -> AccountResult<Self> {
        if address.is_zero() {
            return Err(AccountError::invalid("factory", "zero address"));
        }
        if template.is_zero() {
            return Err(AccountError::invalid("template", "zero address"));
        }
        Ok(Self {
            address,
            template,
            config,
            deployed: HashMap::new(),
            nonces: HashMap::new(),
            wallets: BTreeMap::new(),
            events: Vec::new(),
        })
    }

    /// Address of the factory.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Template every instance delegates to.
    #[must_use]
    pub const fn template(&self) -> Address {
        self.template
    }

    /// Next auto-derived salt nonce of `who`.
    #[must_use]
    pub fn get_next_nonce(&self, who: &Address) -> u64 {
        self.nonces.get(who).copied().unwrap_or_default()
    }

    /// Salt `deploy_wallet` would use for `caller`.
    ///
    /// # Errors
    /// `InvalidArgument` if `salt` is missing for a caller-supplied factory, or given
    /// to an auto-derived one.
    pub fn resolve_salt(&self, caller: Address, salt: Option<B256>) -> AccountResult<B256> {
        match (self.config.salt_strategy, salt) {
            (SaltStrategy::CallerSupplied, Some(salt)) => Ok(salt),
            (SaltStrategy::CallerSupplied, None) => {
                Err(AccountError::invalid("salt", "this factory requires a salt"))
            }
            (SaltStrategy::AutoDerived, None) => {
                let nonce = U256::from(self.get_next_nonce(&caller));
                Ok(keccak256((caller, nonce).abi_encode()))
            }
            (SaltStrategy::AutoDerived, Some(_)) => Err(AccountError::invalid(
                "salt",
                "this factory derives salts itself",
            )),
        }
    }

    /// Address `deploy_wallet` would produce for the same arguments.
    ///
    /// # Errors
    /// `InvalidArgument` if the parameters or salt are invalid.
    pub fn predict_wallet_address(
        &self,
        caller: Address,
        params: &WalletParams,
        salt: Option<B256>,
    ) -> AccountResult<Address> {
        params.validate()?;
        let salt = self.resolve_salt(caller, salt)?;
        Ok(create2_address(
            self.address,
            salt,
            &init_code(self.template, params),
        ))
    }

    /// Creates and initializes an instance for `params`.
    ///
    /// The instance is owned by `params.owners[0]`, has the given guardians and
    /// threshold, and no sponsor.
    ///
    /// # Errors
    /// - `InvalidArgument` if the parameters or salt are invalid.
    /// - `DuplicateDeployment` if the same parameters and salt were deployed before.
    pub fn deploy_wallet(
        &mut self,
        caller: Address,
        params: &WalletParams,
        salt: Option<B256>,
    ) -> AccountResult<Address> {
        params.validate()?;
        let salt = self.resolve_salt(caller, salt)?;
        let key = params.derive_key(salt);
        if let Some(existing) = self.deployed.get(&key) {
            return Err(AccountError::DuplicateDeployment {
                key,
                existing: existing.address,
            });
        }
        let address = create2_address(self.address, salt, &init_code(self.template, params));
        if self.wallets.contains_key(&address) {
            return Err(AccountError::DuplicateDeployment {
                key,
                existing: address,
            });
        }

        let wallet = self.instantiate(address, params)?;
        self.wallets.insert(address, wallet);
        self.deployed.insert(
            key,
            Deployment {
                address,
                salt,
                params: params.clone(),
            },
        );
        if self.config.salt_strategy == SaltStrategy::AutoDerived {
            *self.nonces.entry(caller).or_default() += 1;
        }
        self.events.push(FactoryEvent::WalletDeployed {
            wallet: address,
            owners: params.owners.clone(),
            guardians: params.guardians.clone(),
            threshold: params.threshold,
            salt,
        });
        log::info!(
            "factory {} deployed {address} for {} owners, {} guardians, threshold {}",
            self.address,
            params.owners.len(),
            params.guardians.len(),
            params.threshold
        );
        Ok(address)
    }

    /// Instance created at `address`.
    #[must_use]
    pub fn wallet(&self, address: &Address) -> Option<&DelegateAccount> {
        self.wallets.get(address)
    }

    /// Mutable instance created at `address`.
    pub fn wallet_mut(&mut self, address: &Address) -> Option<&mut DelegateAccount> {
        self.wallets.get_mut(address)
    }

    /// Deployment recorded under `key`.
    #[must_use]
    pub fn deployment_for(&self, key: &B256) -> Option<&Deployment> {
        self.deployed.get(key)
    }

    /// Notifications emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[FactoryEvent] {
        &self.events
    }

    fn instantiate(
        &self,
        address: Address,
        params: &WalletParams,
    ) -> AccountResult<DelegateAccount> {
        let mut wallet = DelegateAccount::new(
            address,
            params.owners[0],
            self.template,
            self.config.account.clone(),
        )?;
        let own = CallContext::internal(address);
        wallet.initialize(&own, Address::ZERO, &params.guardians)?;
        wallet.set_recovery_threshold(&own, params.threshold)?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::b256;

    use super::*;

    fn id(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn params() -> WalletParams {
        WalletParams {
            owners: vec![id(1)],
            guardians: vec![id(2), id(3), id(4)],
            threshold: 2,
        }
    }

    fn factory(strategy: SaltStrategy) -> WalletFactory {
        WalletFactory::new(
            id(0xfa),
            id(0x7e),
            FactoryConfig {
                salt_strategy: strategy,
                ..FactoryConfig::default()
            },
        )
        .unwrap()
    }

    const SALT: B256 =
        b256!("0x0000000000000000000000000000000000000000000000000000000000000042");

    #[test]
    fn test_init_code_layout() {
        let code = init_code(id(0x7e), &params());
        assert_eq!(&code[..20], &PROXY_PREFIX);
        assert_eq!(&code[20..40], id(0x7e).as_slice());
        assert_eq!(&code[40..55], &PROXY_SUFFIX);
        assert_eq!(&code[55..], params().constructor_args().as_slice());
    }

    #[test]
    fn test_create2_formula() {
        let code = init_code(id(0x7e), &params());
        let mut preimage = vec![0xff];
        preimage.extend_from_slice(id(0xfa).as_slice());
        preimage.extend_from_slice(SALT.as_slice());
        preimage.extend_from_slice(keccak256(&code).as_slice());
        let expected = Address::from_slice(&keccak256(preimage)[12..]);

        assert_eq!(create2_address(id(0xfa), SALT, &code), expected);
    }

    #[test]
    fn test_prediction_matches_deployment() {
        let mut factory = factory(SaltStrategy::CallerSupplied);
        let predicted = factory
            .predict_wallet_address(id(9), &params(), Some(SALT))
            .unwrap();
        let deployed = factory.deploy_wallet(id(9), &params(), Some(SALT)).unwrap();
        assert_eq!(predicted, deployed);

        let wallet = factory.wallet(&deployed).unwrap();
        assert_eq!(wallet.owner(), id(1));
        assert_eq!(wallet.guardians(), &[id(2), id(3), id(4)]);
        assert_eq!(wallet.recovery_threshold(), 2);
        assert!(wallet.is_initialized());
        assert_eq!(wallet.logic().implementation, id(0x7e));
    }

    #[test]
    fn test_duplicate_parameters_are_rejected() {
        let mut factory = factory(SaltStrategy::CallerSupplied);
        let first = factory.deploy_wallet(id(9), &params(), Some(SALT)).unwrap();

        let err = factory.deploy_wallet(id(8), &params(), Some(SALT)).unwrap_err();
        assert_eq!(
            err,
            AccountError::DuplicateDeployment {
                key: params().derive_key(SALT),
                existing: first
            }
        );
        assert_eq!(factory.events().len(), 1);
        assert!(factory.wallet(&first).is_some());

        let other_salt = B256::repeat_byte(0x43);
        let second = factory
            .deploy_wallet(id(9), &params(), Some(other_salt))
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_key_covers_every_parameter() {
        let base = params();
        let mut fewer_guardians = base.clone();
        fewer_guardians.guardians.pop();
        let mut higher_threshold = base.clone();
        higher_threshold.threshold = 3;
        let mut more_owners = base.clone();
        more_owners.owners.push(id(5));

        let keys = [
            base.derive_key(SALT),
            base.derive_key(B256::ZERO),
            fewer_guardians.derive_key(SALT),
            higher_threshold.derive_key(SALT),
            more_owners.derive_key(SALT),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let mut factory = factory(SaltStrategy::CallerSupplied);
        let cases = [
            WalletParams {
                owners: vec![],
                ..params()
            },
            WalletParams {
                threshold: 0,
                ..params()
            },
            WalletParams {
                threshold: 4,
                ..params()
            },
            WalletParams {
                owners: vec![Address::ZERO],
                ..params()
            },
            WalletParams {
                guardians: vec![id(2), Address::ZERO],
                threshold: 1,
                ..params()
            },
        ];
        for case in &cases {
            assert!(matches!(
                factory.deploy_wallet(id(9), case, Some(SALT)),
                Err(AccountError::InvalidArgument { .. })
            ));
        }
        assert!(factory.deploy_wallet(id(9), &params(), None).is_err());
        assert!(factory.events().is_empty());
    }

    #[test]
    fn test_auto_derived_salts_advance_per_caller() {
        let mut factory = factory(SaltStrategy::AutoDerived);
        assert_eq!(factory.get_next_nonce(&id(9)), 0);

        let predicted = factory.predict_wallet_address(id(9), &params(), None).unwrap();
        let first = factory.deploy_wallet(id(9), &params(), None).unwrap();
        assert_eq!(predicted, first);
        assert_eq!(factory.get_next_nonce(&id(9)), 1);
        assert_eq!(factory.get_next_nonce(&id(8)), 0);

        let second = factory.deploy_wallet(id(9), &params(), None).unwrap();
        assert_ne!(first, second);
        assert_eq!(factory.get_next_nonce(&id(9)), 2);

        assert!(factory.deploy_wallet(id(9), &params(), Some(SALT)).is_err());
        assert_eq!(factory.get_next_nonce(&id(9)), 2);
    }
}
