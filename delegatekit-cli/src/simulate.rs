//! Scripted scenarios: a factory, an in-memory host, and a list of steps applied to
//! the most recently deployed account.

use alloy_primitives::{Address, Bytes, B256, U256};
use delegatekit_core::{
    AccountError, AccountEvent, AccountResult, Call, CallContext, DelegateAccount, FactoryConfig,
    FactoryEvent, InMemoryHost, WalletFactory, WalletParams,
};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub factory: Address,
    pub template: Address,
    #[serde(default)]
    pub config: FactoryConfig,
    pub timestamp: u64,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Deploy {
        caller: Address,
        owners: Vec<Address>,
        guardians: Vec<Address>,
        threshold: usize,
        salt: Option<B256>,
    },
    /// Credits `who`, or the current account when omitted.
    Fund {
        #[serde(default)]
        who: Option<Address>,
        amount: U256,
    },
    FailTarget {
        target: Address,
    },
    Advance {
        seconds: u64,
    },
    SetDailyLimit {
        caller: Address,
        limit: U256,
    },
    SetSponsor {
        caller: Address,
        sponsor: Address,
    },
    Execute {
        caller: Address,
        target: Address,
        #[serde(default)]
        value: U256,
        #[serde(default)]
        payload: Bytes,
    },
    Sponsored {
        caller: Address,
        target: Address,
        #[serde(default)]
        value: U256,
        #[serde(default)]
        payload: Bytes,
    },
    Recover {
        guardian: Address,
        new_owner: Address,
    },
    CancelRecovery {
        caller: Address,
    },
}

#[derive(Debug, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepResult>,
    pub factory_events: Vec<FactoryEvent>,
    pub wallet: Option<Address>,
    pub owner: Option<Address>,
    pub account_events: Vec<AccountEvent>,
}

/// Runs every step; a rejected step is reported and the scenario continues.
///
/// # Errors
/// Fails if the factory cannot be created.
pub fn run(scenario: &Scenario) -> Result<Report> {
    let mut factory = WalletFactory::new(
        scenario.factory,
        scenario.template,
        scenario.config.clone(),
    )?;
    let mut host = InMemoryHost::new(scenario.timestamp);
    let mut current: Option<Address> = None;
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = apply(&mut factory, &mut host, &mut current, step);
        let result = match outcome {
            Ok(()) => StepResult {
                index,
                ok: true,
                error: None,
            },
            Err(err) => {
                tracing::info!(index, %err, "step rejected");
                StepResult {
                    index,
                    ok: false,
                    error: Some(err.to_string()),
                }
            }
        };
        steps.push(result);
    }

    let account = current.and_then(|wallet| factory.wallet(&wallet));
    Ok(Report {
        steps,
        factory_events: factory.events().to_vec(),
        wallet: current,
        owner: account.map(DelegateAccount::owner),
        account_events: account
            .map(|account| account.events().to_vec())
            .unwrap_or_default(),
    })
}

fn current_account(
    factory: &mut WalletFactory,
    current: Option<Address>,
) -> AccountResult<&mut DelegateAccount> {
    current
        .and_then(|wallet| factory.wallet_mut(&wallet))
        .ok_or_else(|| AccountError::InvalidArgument {
            attribute: "step".to_string(),
            reason: "no account deployed yet".to_string(),
        })
}

fn apply(
    factory: &mut WalletFactory,
    host: &mut InMemoryHost,
    current: &mut Option<Address>,
    step: &Step,
) -> AccountResult<()> {
    let wallet = *current;

    match step {
        Step::Deploy {
            caller,
            owners,
            guardians,
            threshold,
            salt,
        } => {
            let params = WalletParams {
                owners: owners.clone(),
                guardians: guardians.clone(),
                threshold: *threshold,
            };
            *current = Some(factory.deploy_wallet(*caller, &params, *salt)?);
        }
        Step::Fund { who, amount } => {
            let who = match who {
                Some(who) => *who,
                None => current_account(factory, wallet)?.address(),
            };
            host.fund(who, *amount);
        }
        Step::FailTarget { target } => host.fail_target(*target),
        Step::Advance { seconds } => host.advance(*seconds),
        Step::SetDailyLimit { caller, limit } => {
            let ctx = CallContext::direct(*caller);
            current_account(factory, wallet)?.set_daily_limit(&ctx, *limit)?;
        }
        Step::SetSponsor { caller, sponsor } => {
            let ctx = CallContext::direct(*caller);
            current_account(factory, wallet)?.set_approved_sponsor(&ctx, *sponsor)?;
        }
        Step::Execute {
            caller,
            target,
            value,
            payload,
        } => {
            let ctx = CallContext::direct(*caller).with_value(*value);
            let call = Call::new(*target, *value, payload.clone());
            current_account(factory, wallet)?.execute(&ctx, host, &call)?;
        }
        Step::Sponsored {
            caller,
            target,
            value,
            payload,
        } => {
            let ctx = CallContext::direct(*caller).with_value(*value);
            let call = Call::new(*target, *value, payload.clone());
            current_account(factory, wallet)?.sponsored_execute(&ctx, host, &call)?;
        }
        Step::Recover {
            guardian,
            new_owner,
        } => {
            let ctx = CallContext::direct(*guardian);
            current_account(factory, wallet)?.initiate_recovery(&ctx, *new_owner)?;
        }
        Step::CancelRecovery { caller } => {
            let ctx = CallContext::direct(*caller);
            current_account(factory, wallet)?.cancel_recovery(&ctx)?;
        }
    }
    Ok(())
}

/// Parses a scenario from JSON.
///
/// # Errors
/// Fails on malformed JSON or unknown steps.
pub fn parse(json: &str) -> Result<Scenario> {
    serde_json::from_str(json).map_err(|err| eyre!("parsing scenario: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "factory": "0xfafafafafafafafafafafafafafafafafafafafa",
        "template": "0x7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e",
        "timestamp": 1700000000,
        "steps": [
            { "step": "fund", "amount": "0x64" },
            { "step": "deploy",
              "caller": "0xdededededededededededededededededededede",
              "owners": ["0x0101010101010101010101010101010101010101"],
              "guardians": [
                "0x6161616161616161616161616161616161616161",
                "0x6262626262626262626262626262626262626262"
              ],
              "threshold": 2,
              "salt": "0x00000000000000000000000000000000000000000000000000000000000000aa" },
            { "step": "fund",
              "who": "0x0101010101010101010101010101010101010101",
              "amount": "0x64" },
            { "step": "set_daily_limit",
              "caller": "0x0101010101010101010101010101010101010101",
              "limit": "0x32" },
            { "step": "execute",
              "caller": "0x0101010101010101010101010101010101010101",
              "target": "0x1111111111111111111111111111111111111111",
              "value": "0x28" },
            { "step": "execute",
              "caller": "0x0101010101010101010101010101010101010101",
              "target": "0x1111111111111111111111111111111111111111",
              "value": "0x14" },
            { "step": "recover",
              "guardian": "0x6161616161616161616161616161616161616161",
              "new_owner": "0x4444444444444444444444444444444444444444" },
            { "step": "recover",
              "guardian": "0x6262626262626262626262626262626262626262",
              "new_owner": "0x4444444444444444444444444444444444444444" }
        ]
    }"#;

    #[test]
    fn test_scenario_reports_each_step() {
        let scenario = parse(SCENARIO).unwrap();
        let report = run(&scenario).unwrap();

        let flags: Vec<bool> = report.steps.iter().map(|step| step.ok).collect();
        assert_eq!(flags, vec![false, true, true, true, true, false, true, true]);
        assert!(report.steps[5]
            .error
            .as_deref()
            .is_some_and(|err| err.starts_with("limit_exceeded")));
        assert_eq!(report.owner, Some(Address::repeat_byte(0x44)));
        assert_eq!(report.factory_events.len(), 1);
    }

    #[test]
    fn test_scenario_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, SCENARIO).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let report = run(&parse(&json).unwrap()).unwrap();
        let rendered = serde_json::to_value(&report).unwrap();
        assert_eq!(rendered["steps"].as_array().unwrap().len(), 8);
        assert!(rendered["steps"][0]["error"].is_string());
        assert!(rendered["steps"][1].get("error").is_none());
    }

    #[test]
    fn test_bundled_recovery_scenario() {
        let scenario = parse(include_str!("../scenarios/recovery.json")).unwrap();
        let report = run(&scenario).unwrap();

        let failed: Vec<usize> = report
            .steps
            .iter()
            .filter(|step| !step.ok)
            .map(|step| step.index)
            .collect();
        assert_eq!(failed, vec![4, 9]);
        assert_eq!(report.owner, Some(Address::repeat_byte(0x44)));
        assert!(report
            .account_events
            .iter()
            .any(|event| matches!(event, AccountEvent::RecoverySucceeded { .. })));
    }
}
