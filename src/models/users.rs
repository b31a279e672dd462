use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum VipTier {
    #[default]
    #[serde(rename = "VIP_0")]
    Vip0,
    #[serde(rename = "VIP_1")]
    Vip1,
    #[serde(rename = "VIP_2")]
    Vip2,
    #[serde(rename = "VIP_3")]
    Vip3,
}

impl VipTier {
    pub fn level(&self) -> u8 {
        match self {
            VipTier::Vip0 => 0,
            VipTier::Vip1 => 1,
            VipTier::Vip2 => 2,
            VipTier::Vip3 => 3,
        }
    }
}

impl fmt::Display for VipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VIP {}", self.level())
    }
}

/// User info as reported by `/api/user/info/{id}`. Amounts are reais.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub phone: String,
    pub balance: f64,
    pub vip_type: VipTier,
    pub referal_code: String,
    pub referal_count: u64,
    pub referal_bonus: f64,
    pub referal_investments: f64,
    pub referal_deposits: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Balances {
    pub balance: f64,
    pub withdrawal_balance: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BalanceEnvelope {
    pub data: Balances,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
    pub user: Option<LoginUser>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewUser {
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PasswordUpdate {
    pub password: String,
}
