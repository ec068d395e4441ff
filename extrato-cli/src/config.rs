//! Run configuration: fund credentials, provider endpoints and the
//! known-accounts fallback table, loaded from one TOML file. No global
//! state; the loaded `Config` is passed into the orchestrator.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use extrato_client::{Credential, Endpoints};
use extrato_core::AccountRef;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Endpoints,
    pub funds: BTreeMap<String, FundConfig>,
    /// Accounts known from previous statements, keyed by fund display name.
    /// Used when the dynamic account listing is rejected with an auth error.
    #[serde(default)]
    pub known_accounts: BTreeMap<String, Vec<KnownAccount>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FundConfig {
    /// Display name; appears in file names and keys the known-accounts table.
    pub name: String,
    #[serde(flatten)]
    pub credential: Credential,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnownAccount {
    pub branch: String,
    pub number: String,
}

impl KnownAccount {
    pub fn to_account_ref(&self) -> AccountRef {
        AccountRef::new(self.branch.clone(), self.number.clone())
    }
}

impl Config {
    /// Known accounts for one fund, by display name.
    pub fn fallback_accounts(&self, fund_name: &str) -> Vec<AccountRef> {
        self.known_accounts
            .get(fund_name)
            .map(|accounts| accounts.iter().map(KnownAccount::to_account_ref).collect())
            .unwrap_or_default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: Config = toml::from_str(&raw).context("parse config")?;

    for (id, fund) in &config.funds {
        if fund.credential.client_id.is_empty() || fund.credential.client_secret.is_empty() {
            bail!("fund {id} has empty credentials");
        }
    }
    if config.funds.is_empty() {
        bail!("no funds configured in {}", path.display());
    }
    Ok(config)
}
