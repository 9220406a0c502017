//! Layered configuration: compiled defaults, then a TOML file, then
//! `CRANK_`-prefixed environment overrides.
//!
//! Example: `CRANK_RUN__ITERATION_CAP=8` -> `run.iteration_cap`.

use crate::domain::instruction::ResourceBudget;
use crate::domain::ControllerProfile;
use crate::foundation::constants::DEFAULT_ITERATION_CAP;
use crate::foundation::{Address, EngineError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "CRANK_";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub budget: BudgetSettings,
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RpcSettings {
    #[serde(default)]
    pub node_url: String,
    /// Poll interval while waiting on confirmation.
    #[serde(default = "default_confirm_poll_millis")]
    pub confirm_poll_millis: u64,
}

fn default_confirm_poll_millis() -> u64 {
    400
}

/// Remote program identity, addresses as hex strings.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ControllerSettings {
    #[serde(default)]
    pub program_id: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub system_resource: String,
    #[serde(default)]
    pub table_program: String,
    #[serde(default)]
    pub receipt_tokens: Vec<String>,
    #[serde(default)]
    pub pricing_sources: Vec<String>,
}

impl ControllerSettings {
    pub fn profile(&self) -> Result<ControllerProfile> {
        Ok(ControllerProfile {
            program_id: parse_address("controller.program_id", &self.program_id)?,
            authority: parse_address("controller.authority", &self.authority)?,
            system_resource: parse_address("controller.system_resource", &self.system_resource)?,
            table_program: parse_address("controller.table_program", &self.table_program)?,
            receipt_tokens: parse_address_list("controller.receipt_tokens", &self.receipt_tokens)?,
            pricing_sources: parse_address_list("controller.pricing_sources", &self.pricing_sources)?,
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BudgetSettings {
    #[serde(default)]
    pub scratch_bytes: Option<u32>,
    #[serde(default)]
    pub unit_price_micro: Option<u64>,
    #[serde(default)]
    pub unit_limit: Option<u32>,
}

impl BudgetSettings {
    pub fn to_budget(&self) -> Option<ResourceBudget> {
        if self.scratch_bytes.is_none() && self.unit_price_micro.is_none() && self.unit_limit.is_none() {
            return None;
        }
        Some(ResourceBudget {
            scratch_bytes: self.scratch_bytes,
            unit_price_micro: self.unit_price_micro,
            unit_limit: self.unit_limit,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunSettings {
    #[serde(default = "default_iteration_cap")]
    pub iteration_cap: u32,
    #[serde(default)]
    pub fee_payer: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { iteration_cap: default_iteration_cap(), fee_payer: String::new() }
    }
}

fn default_iteration_cap() -> u32 {
    DEFAULT_ITERATION_CAP
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    if value.trim().is_empty() {
        return Err(EngineError::config(format!("{field} is required")));
    }
    value.parse().map_err(|err: EngineError| EngineError::config(format!("{field}: {err}")))
}

fn parse_address_list(field: &str, values: &[String]) -> Result<Vec<Address>> {
    values.iter().map(|value| parse_address(field, value)).collect()
}

/// Load configuration, layering the TOML file (when given) and environment
/// over compiled defaults, then validate.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    let config: EngineConfig = figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract()?;
    validate(&config)?;
    debug!("config loaded node_url={} iteration_cap={}", config.rpc.node_url, config.run.iteration_cap);
    Ok(config)
}

pub fn validate(config: &EngineConfig) -> Result<()> {
    if config.rpc.node_url.trim().is_empty() {
        return Err(EngineError::config("rpc.node_url is required"));
    }
    if config.run.iteration_cap == 0 {
        return Err(EngineError::config("run.iteration_cap must be at least 1"));
    }
    if config.run.fee_payer.trim().is_empty() {
        return Err(EngineError::config("run.fee_payer is required"));
    }
    config.controller.profile()?;
    Ok(())
}
