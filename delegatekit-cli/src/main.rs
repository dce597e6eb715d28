//! delegatekit - developer CLI for delegated accounts
//!
//! Predicts factory addresses, builds and signs meta-execution digests, recovers
//! signers, and replays scripted account scenarios against an in-memory host.

use std::path::PathBuf;

use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy_primitives::{Address, Bytes, B256, U256};
use clap::{Parser, Subcommand};
use delegatekit_core::{
    signature::{meta_digest, recover_signer},
    FactoryConfig, WalletFactory, WalletParams,
};
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

mod simulate;

/// delegatekit - developer CLI for delegated accounts
#[derive(Parser, Debug)]
#[command(name = "delegatekit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `delegatekit_core=debug`
    #[arg(long, env = "DELEGATEKIT_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict the address a factory would deploy an account to
    Predict {
        /// Factory address
        #[arg(long)]
        factory: Address,
        /// Template the accounts delegate to
        #[arg(long)]
        template: Address,
        /// Account owner; repeat for several, the first is the primary owner
        #[arg(long = "owner", required = true)]
        owners: Vec<Address>,
        /// Guardian; repeat for several
        #[arg(long = "guardian")]
        guardians: Vec<Address>,
        /// Guardian votes needed to recover
        #[arg(long, default_value_t = 1)]
        threshold: usize,
        /// CREATE2 salt; omit for auto-derived factories
        #[arg(long)]
        salt: Option<B256>,
        /// Deployer, used to derive the salt
        #[arg(long, default_value_t = Address::ZERO)]
        caller: Address,
        /// Factory configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the digest an owner signs to authorize a meta-execution
    MetaDigest(MetaCall),

    /// Sign a meta-execution with a local key
    SignMeta {
        #[command(flatten)]
        call: MetaCall,
        /// Hex-encoded secp256k1 private key
        #[arg(long, env = "DELEGATEKIT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Recover the address that signed a digest
    RecoverSigner {
        /// 32-byte digest
        #[arg(long)]
        digest: B256,
        /// 65-byte `r || s || v` signature, hex
        #[arg(long)]
        signature: Bytes,
    },

    /// Replay a JSON scenario against an in-memory host and print the events
    Simulate {
        /// Scenario file
        scenario: PathBuf,
    },
}

/// The parameters a meta-execution signature covers.
#[derive(clap::Args, Debug)]
struct MetaCall {
    /// Call target
    #[arg(long)]
    target: Address,
    /// Value sent with the call
    #[arg(long, default_value_t = U256::ZERO)]
    value: U256,
    /// Call data, hex
    #[arg(long, default_value = "0x")]
    payload: Bytes,
    /// Replay-protection nonce
    #[arg(long)]
    nonce: U256,
}

impl MetaCall {
    fn digest(&self) -> B256 {
        meta_digest(self.target, self.value, &self.payload, self.nonce)
    }
}

/// Installs the global stderr subscriber. An unparsable filter falls back to `warn`.
fn install_subscriber(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = install_subscriber(&cli.log) {
        eprintln!("warning: logging disabled, failed to install subscriber: {err}");
    }

    match cli.command {
        Commands::Predict {
            factory,
            template,
            owners,
            guardians,
            threshold,
            salt,
            caller,
            config,
        } => {
            let config = match config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .wrap_err_with(|| format!("reading {}", path.display()))?;
                    FactoryConfig::from_json(&json)?
                }
                None => FactoryConfig::default(),
            };
            let factory = WalletFactory::new(factory, template, config)?;
            let params = WalletParams {
                owners,
                guardians,
                threshold,
            };
            let address = factory.predict_wallet_address(caller, &params, salt)?;
            let salt = factory.resolve_salt(caller, salt)?;
            tracing::debug!(%address, %salt, "predicted");
            println!("{address}");
        }
        Commands::MetaDigest(call) => println!("{}", call.digest()),
        Commands::SignMeta { call, private_key } => {
            let signer: PrivateKeySigner = private_key
                .trim()
                .parse()
                .wrap_err("invalid private key")?;
            let digest = call.digest();
            let signature = signer.sign_hash_sync(&digest)?;
            tracing::info!(signer = %signer.address(), %digest, "signed meta-execution");
            println!("0x{}", hex::encode(signature.as_bytes()));
        }
        Commands::RecoverSigner { digest, signature } => {
            println!("{}", recover_signer(&digest, &signature)?);
        }
        Commands::Simulate { scenario } => {
            let json = std::fs::read_to_string(&scenario)
                .wrap_err_with(|| format!("reading {}", scenario.display()))?;
            let scenario = simulate::parse(&json)?;
            let report = simulate::run(&scenario)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_subscriber_install_reports_error() {
        let _ = install_subscriber("not a [valid filter");
        assert!(install_subscriber("debug").is_err());
    }
}
