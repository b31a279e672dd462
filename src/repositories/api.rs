use async_trait::async_trait;
use serde_json::Value;

use crate::models::{
    plans::{BuyPlan, Investment, Plan},
    transactions::{
        Deposit, GatewayDeposit, GatewayWithdrawal, NewDeposit, NewWithdrawal, Withdrawal,
    },
    users::{Balances, Credentials, LoginResponse, NewUser, PasswordUpdate, User},
};

mod http;

pub use http::HttpApi;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text worth showing to the user: the message the API put in the error
    /// body, or what went wrong on the wire.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Transport(message) => Some(message),
            ApiError::Decode(_) => None,
        }
    }
}

/// Picks the human readable message out of an error body. The gateway
/// endpoints use `details`/`error`, the user endpoints use `message`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    ["details", "error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

/// The remote platform API. Balances and prices on the user endpoints are
/// reais; gateway endpoints and transaction history use centavos.
#[async_trait]
pub trait PlatformApi: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    async fn register(&self, user: &NewUser) -> Result<(), ApiError>;
    async fn update_password(
        &self,
        user_id: &str,
        update: &PasswordUpdate,
    ) -> Result<(), ApiError>;
    async fn user_info(&self, user_id: &str) -> Result<User, ApiError>;
    async fn balance(&self, user_id: &str) -> Result<Balances, ApiError>;
    async fn plans(&self) -> Result<Vec<Plan>, ApiError>;
    async fn buy_plan(&self, purchase: &BuyPlan) -> Result<(), ApiError>;
    async fn investments(&self, user_id: &str) -> Result<Vec<Investment>, ApiError>;
    async fn deposits(&self, user_id: &str) -> Result<Vec<Deposit>, ApiError>;
    async fn withdrawals(&self, user_id: &str) -> Result<Vec<Withdrawal>, ApiError>;
    async fn gateway_deposit(&self, deposit: &NewDeposit) -> Result<GatewayDeposit, ApiError>;
    async fn gateway_withdraw(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<GatewayWithdrawal, ApiError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_details_then_error_then_message() {
        assert_eq!(
            error_message(r#"{"details": "Saldo insuficiente", "error": "Bad Request"}"#),
            Some("Saldo insuficiente".to_string())
        );
        assert_eq!(
            error_message(r#"{"error": "Chave inválida"}"#),
            Some("Chave inválida".to_string())
        );
        assert_eq!(
            error_message(r#"{"message": "Usuário não encontrado"}"#),
            Some("Usuário não encontrado".to_string())
        );
        assert_eq!(error_message(r#"{"details": "  ", "message": "x"}"#), Some("x".to_string()));
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"details": 3}"#), None);
    }
}
