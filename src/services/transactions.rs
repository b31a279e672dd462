use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::{
    formatting::{format_cents, parse_cents},
    outcome::{Notification, Outcome, Route},
    pix, RequestHandler, Service, ServiceError,
};
use crate::{
    models::{
        pix::PixKeyType,
        transactions::{Cents, Deposit, NewDeposit, NewWithdrawal, Withdrawal},
    },
    repositories::api::PlatformApi,
    settings::{DepositMode, Limits},
};

/// Quick-pick deposit amounts, in reais.
pub const DEPOSIT_PRESETS: [u64; 8] = [30, 50, 100, 150, 200, 250, 300, 400];

pub enum TransactionRequest {
    Deposit {
        user_id: String,
        amount: String,
        response: oneshot::Sender<Result<Outcome, ServiceError>>,
    },
    Withdraw {
        user_id: String,
        amount: String,
        pix_key_type: Option<PixKeyType>,
        pix_key: String,
        response: oneshot::Sender<Result<Outcome, ServiceError>>,
    },
    ListDeposits {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Deposit>, ServiceError>>,
    },
    ListWithdrawals {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Withdrawal>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct TransactionRequestHandler {
    api: Arc<dyn PlatformApi>,
    min_deposit: Cents,
    min_withdrawal: Cents,
    deposit_mode: DepositMode,
}

fn numeric_user_id(user_id: &str) -> Result<i64, ServiceError> {
    user_id
        .trim()
        .parse()
        .map_err(|_| ServiceError::Unauthenticated)
}

impl TransactionRequestHandler {
    pub fn new(api: Arc<dyn PlatformApi>, limits: &Limits, deposit_mode: DepositMode) -> Self {
        TransactionRequestHandler {
            api,
            min_deposit: Cents(limits.min_deposit_in_cents),
            min_withdrawal: Cents(limits.min_withdrawal_in_cents),
            deposit_mode,
        }
    }

    pub async fn deposit(&self, user_id: &str, amount: &str) -> Result<Outcome, ServiceError> {
        if self.deposit_mode == DepositMode::ComingSoon {
            log::info!("Deposits are not open yet, sending user {} to release page.", user_id);
            return Ok(Outcome::notify(Notification::info("Depósitos disponíveis em breve."))
                .redirect_to(Route::Release));
        }

        let amount = parse_cents(amount)
            .ok_or_else(|| ServiceError::Validation("Informe o valor do depósito".to_string()))?;
        if amount < self.min_deposit {
            return Err(ServiceError::Validation(format!(
                "Valor mínimo de depósito é {}",
                format_cents(self.min_deposit)
            )));
        }
        let user_id = numeric_user_id(user_id)?;

        log::info!("Requesting deposit of {} cents for user {}", amount.0, user_id);
        let deposit = self
            .api
            .gateway_deposit(&NewDeposit { amount, user_id })
            .await
            .map_err(ServiceError::api("Erro ao processar depósito"))?;

        log::info!(
            "Deposit {} created, payment at {}",
            deposit.external_ref.as_deref().unwrap_or("-"),
            deposit.payment_url
        );

        Ok(Outcome::notify(Notification::success("Depósito gerado com sucesso!"))
            .redirect_to(Route::External(deposit.payment_url)))
    }

    pub async fn withdraw(
        &self,
        user_id: &str,
        amount: &str,
        pix_key_type: Option<PixKeyType>,
        pix_key: &str,
    ) -> Result<Outcome, ServiceError> {
        let amount = parse_cents(amount)
            .ok_or_else(|| ServiceError::Validation("Informe o valor do saque".to_string()))?;

        let pix_key_type = match pix_key_type {
            Some(kind) if !pix_key.trim().is_empty() => kind,
            _ => {
                return Err(ServiceError::Validation(
                    "Informe a chave PIX e o tipo".to_string(),
                ))
            }
        };

        if !pix::validate_key(pix_key_type, pix_key) {
            return Err(ServiceError::Validation("Chave PIX inválida".to_string()));
        }

        if amount < self.min_withdrawal {
            return Err(ServiceError::Validation(format!(
                "Valor mínimo de saque é {}",
                format_cents(self.min_withdrawal)
            )));
        }
        let user_id = numeric_user_id(user_id)?;

        log::info!(
            "Requesting withdrawal of {} cents for user {} to {} key",
            amount.0,
            user_id,
            pix_key_type
        );
        let withdrawal = self
            .api
            .gateway_withdraw(&NewWithdrawal {
                amount,
                user_id,
                pix_key_type,
                pix_key: pix::submission_key(pix_key_type, pix_key),
            })
            .await
            .map_err(ServiceError::api("Erro ao processar saque"))?;

        if withdrawal.status != "pending" {
            log::warn!("Withdrawal answered with status {}", withdrawal.status);
            return Err(ServiceError::Rejected(
                "Erro ao processar saque. Tente novamente.".to_string(),
            ));
        }

        Ok(Outcome::notify(Notification::success("Saque solicitado com sucesso!"))
            .redirect_to(Route::Withdrawals))
    }

    pub async fn list_deposits(&self, user_id: &str) -> Result<Vec<Deposit>, ServiceError> {
        self.api
            .deposits(user_id)
            .await
            .map_err(ServiceError::api("Erro ao buscar depósitos"))
    }

    pub async fn list_withdrawals(&self, user_id: &str) -> Result<Vec<Withdrawal>, ServiceError> {
        self.api
            .withdrawals(user_id)
            .await
            .map_err(ServiceError::api("Erro ao buscar saques"))
    }
}

#[async_trait]
impl RequestHandler<TransactionRequest> for TransactionRequestHandler {
    async fn handle_request(&self, request: TransactionRequest) {
        match request {
            TransactionRequest::Deposit {
                user_id,
                amount,
                response,
            } => {
                let result = self.deposit(&user_id, &amount).await;
                let _ = response.send(result);
            }
            TransactionRequest::Withdraw {
                user_id,
                amount,
                pix_key_type,
                pix_key,
                response,
            } => {
                let result = self
                    .withdraw(&user_id, &amount, pix_key_type, &pix_key)
                    .await;
                let _ = response.send(result);
            }
            TransactionRequest::ListDeposits { user_id, response } => {
                let _ = response.send(self.list_deposits(&user_id).await);
            }
            TransactionRequest::ListWithdrawals { user_id, response } => {
                let _ = response.send(self.list_withdrawals(&user_id).await);
            }
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        TransactionService {}
    }
}

#[async_trait]
impl Service<TransactionRequest, TransactionRequestHandler> for TransactionService {}
