use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, oneshot};

use crate::{
    models::{
        pix::PixKeyType,
        plans::{Investment, Plan},
        referrals::Referral,
        session::Session,
        transactions::{Deposit, Withdrawal},
        users::{Balances, User},
    },
    repositories::api::{ApiError, PlatformApi},
    settings::Settings,
};

pub mod balance;
pub mod formatting;
pub mod outcome;
pub mod pix;
pub mod plans;
pub mod session;
pub mod transactions;
pub mod users;
pub mod view;

use outcome::Outcome;
use plans::{PlanRequest, Purchase};
use transactions::TransactionRequest;
use users::UserRequest;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Usuário não autenticado")]
    Unauthenticated,
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("{0}")]
    Rejected(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

impl ServiceError {
    /// Wraps an API failure, keeping the message the API sent or falling back
    /// to `fallback`.
    pub fn api(fallback: &'static str) -> impl FnOnce(ApiError) -> ServiceError {
        move |source| ServiceError::Api {
            message: source.message().unwrap_or(fallback).to_string(),
            source,
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

/// Client side of the running services. Every call is a request on the
/// owning service's channel answered through a oneshot.
#[derive(Clone)]
pub struct ServiceManager {
    api: Arc<dyn PlatformApi>,
    poll_interval: Duration,
    user_channel: mpsc::Sender<UserRequest>,
    plan_channel: mpsc::Sender<PlanRequest>,
    transaction_channel: mpsc::Sender<TransactionRequest>,
}

async fn ask<R, T>(
    channel: &mpsc::Sender<R>,
    service: &str,
    build: impl FnOnce(oneshot::Sender<T>) -> R,
) -> Result<T, ServiceError> {
    let (tx, rx) = oneshot::channel();

    channel
        .send(build(tx))
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?;

    rx.await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))
}

impl ServiceManager {
    pub async fn login(
        &self,
        phone: String,
        password: String,
        admin: bool,
    ) -> Result<(Session, Outcome), ServiceError> {
        ask(&self.user_channel, "UserService", |response| UserRequest::Login {
            phone,
            password,
            admin,
            response,
        })
        .await?
    }

    pub async fn register(
        &self,
        phone: String,
        password: String,
        confirm_password: String,
        invited_by: Option<String>,
    ) -> Result<Outcome, ServiceError> {
        ask(&self.user_channel, "UserService", |response| {
            UserRequest::Register {
                phone,
                password,
                confirm_password,
                invited_by,
                response,
            }
        })
        .await?
    }

    pub async fn change_password(
        &self,
        user_id: String,
        password: String,
        confirm_password: String,
        confirmed: bool,
    ) -> Result<Outcome, ServiceError> {
        ask(&self.user_channel, "UserService", |response| {
            UserRequest::ChangePassword {
                user_id,
                password,
                confirm_password,
                confirmed,
                response,
            }
        })
        .await?
    }

    pub async fn user(&self, id: String) -> Result<User, ServiceError> {
        ask(&self.user_channel, "UserService", |response| {
            UserRequest::GetUser { id, response }
        })
        .await?
    }

    pub async fn referral(&self, id: String) -> Result<Referral, ServiceError> {
        ask(&self.user_channel, "UserService", |response| {
            UserRequest::GetReferral { id, response }
        })
        .await?
    }

    pub async fn plans(&self) -> Result<Vec<Plan>, ServiceError> {
        ask(&self.plan_channel, "PlanService", |response| {
            PlanRequest::ListPlans { response }
        })
        .await?
    }

    pub async fn investments(&self, user_id: String) -> Result<Vec<Investment>, ServiceError> {
        ask(&self.plan_channel, "PlanService", |response| {
            PlanRequest::ListInvestments { user_id, response }
        })
        .await?
    }

    pub async fn buy_plan(&self, user_id: String, plan_id: i64) -> Result<Purchase, ServiceError> {
        ask(&self.plan_channel, "PlanService", |response| {
            PlanRequest::BuyPlan {
                user_id,
                plan_id,
                response,
            }
        })
        .await
    }

    pub async fn deposit(&self, user_id: String, amount: String) -> Result<Outcome, ServiceError> {
        ask(&self.transaction_channel, "TransactionService", |response| {
            TransactionRequest::Deposit {
                user_id,
                amount,
                response,
            }
        })
        .await?
    }

    pub async fn withdraw(
        &self,
        user_id: String,
        amount: String,
        pix_key_type: Option<PixKeyType>,
        pix_key: String,
    ) -> Result<Outcome, ServiceError> {
        ask(&self.transaction_channel, "TransactionService", |response| {
            TransactionRequest::Withdraw {
                user_id,
                amount,
                pix_key_type,
                pix_key,
                response,
            }
        })
        .await?
    }

    pub async fn deposits(&self, user_id: String) -> Result<Vec<Deposit>, ServiceError> {
        ask(&self.transaction_channel, "TransactionService", |response| {
            TransactionRequest::ListDeposits { user_id, response }
        })
        .await?
    }

    pub async fn withdrawals(&self, user_id: String) -> Result<Vec<Withdrawal>, ServiceError> {
        ask(&self.transaction_channel, "TransactionService", |response| {
            TransactionRequest::ListWithdrawals { user_id, response }
        })
        .await?
    }

    pub async fn balance(&self, user_id: &str) -> Result<Balances, ServiceError> {
        balance::fetch_balance(self.api.as_ref(), user_id).await
    }

    pub fn poll_balance(&self, user_id: String) -> balance::PollerHandle {
        balance::BalancePoller::new(self.api.clone(), user_id, self.poll_interval).start()
    }
}

pub fn start_services(api: Arc<dyn PlatformApi>, settings: &Settings) -> ServiceManager {
    let (user_tx, mut user_rx) = mpsc::channel(64);
    let (plan_tx, mut plan_rx) = mpsc::channel(64);
    let (transaction_tx, mut transaction_rx) = mpsc::channel(64);

    let mut user_service = users::UserService::new();
    let mut plan_service = plans::PlanService::new();
    let mut transaction_service = transactions::TransactionService::new();

    log::debug!("Starting user service.");
    let user_handler =
        users::UserRequestHandler::new(api.clone(), settings.referral.link_base.clone());
    tokio::spawn(async move {
        user_service.run(user_handler, &mut user_rx).await;
    });

    log::debug!("Starting plan service.");
    let plan_handler = plans::PlanRequestHandler::new(api.clone());
    tokio::spawn(async move {
        plan_service.run(plan_handler, &mut plan_rx).await;
    });

    log::debug!("Starting transaction service.");
    let transaction_handler = transactions::TransactionRequestHandler::new(
        api.clone(),
        &settings.limits,
        settings.deposit.mode,
    );
    tokio::spawn(async move {
        transaction_service
            .run(transaction_handler, &mut transaction_rx)
            .await;
    });

    ServiceManager {
        api,
        poll_interval: Duration::from_secs(settings.poller.interval_secs),
        user_channel: user_tx,
        plan_channel: plan_tx,
        transaction_channel: transaction_tx,
    }
}
