use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Poller {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub min_deposit_in_cents: u64,
    pub min_withdrawal_in_cents: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMode {
    Gateway,
    ComingSoon,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deposit {
    pub mode: DepositMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Referral {
    pub link_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: Api,
    #[serde(default)]
    pub session: Session,
    pub poller: Poller,
    pub limits: Limits,
    pub deposit: Deposit,
    pub referral: Referral,
}

impl Settings {
    /// Built-in defaults, then the optional file at `path`, then `EPIROC_*`
    /// variables (`EPIROC_API__URL`, `EPIROC_DEPOSIT__MODE`, ...).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("api.url", "https://api.epiroc.lat")?
            .set_default("api.timeout_secs", 15)?
            .set_default("poller.interval_secs", 30)?
            .set_default("limits.min_deposit_in_cents", 8000)?
            .set_default("limits.min_withdrawal_in_cents", 2000)?
            .set_default("deposit.mode", "gateway")?
            .set_default("referral.link_base", "https://epiroc.lat")?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("EPIROC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
