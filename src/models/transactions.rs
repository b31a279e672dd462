use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer amount in centavos, the convention of the gateway endpoints and of
/// the deposit/withdrawal history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    /// Converts a reais amount reported by the user endpoints, rounding to
    /// the nearest centavo. Negative and non-finite values clamp to zero.
    pub fn from_reais(reais: f64) -> Self {
        if !reais.is_finite() || reais <= 0.0 {
            return Cents(0);
        }
        Cents((reais * 100.0).round() as u64)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::services::formatting::format_cents(*self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    WaitingPayment,
    Approved,
    Pending,
    Refused,
    #[serde(untagged)]
    Other(String),
}

impl DepositStatus {
    pub fn label(&self) -> &str {
        match self {
            DepositStatus::Approved => "Aprovado",
            DepositStatus::WaitingPayment => "Aguardando",
            DepositStatus::Pending => "Pendente",
            DepositStatus::Refused => "Recusado",
            DepositStatus::Other(status) => status,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Refused,
    #[serde(untagged)]
    Other(String),
}

impl WithdrawalStatus {
    pub fn label(&self) -> &str {
        match self {
            WithdrawalStatus::Approved => "Aprovado",
            WithdrawalStatus::Pending => "Pendente",
            WithdrawalStatus::Refused => "Recusado",
            WithdrawalStatus::Other(status) => status,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Deposit {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub user_id: i64,
    pub amount: Cents,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub user_id: i64,
    pub amount: Cents,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeposit {
    pub amount: Cents,
    pub user_id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayDeposit {
    #[serde(default, alias = "externalRef")]
    pub external_ref: Option<String>,
    #[serde(alias = "paymentUrl", alias = "url")]
    pub payment_url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWithdrawal {
    pub amount: Cents,
    pub user_id: i64,
    pub pix_key_type: crate::models::pix::PixKeyType,
    pub pix_key: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayWithdrawal {
    #[serde(default)]
    pub external_ref: Option<String>,
    pub status: String,
}
