use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{error_message, ApiError, PlatformApi};
use crate::models::{
    plans::{BuyPlan, Investment, Plan},
    transactions::{
        Deposit, GatewayDeposit, GatewayWithdrawal, NewDeposit, NewWithdrawal, Withdrawal,
    },
    users::{
        BalanceEnvelope, Balances, Credentials, LoginResponse, NewUser, PasswordUpdate, User,
    },
};

pub struct HttpApi {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        check_status(status, body)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;
        decode(&body)
    }
}

fn check_status(status: StatusCode, body: String) -> Result<String, ApiError> {
    if !status.is_success() {
        log::warn!("API answered {} with body: {}", status, body);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        log::debug!("Undecodable API body: {}", body);
        ApiError::Decode(e.to_string())
    })
}

#[async_trait]
impl PlatformApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint("/api/user/login"))
            .json(credentials);
        self.send(request).await
    }

    async fn register(&self, user: &NewUser) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint("/api/user/register"))
            .json(user);
        self.send_raw(request).await.map(|_| ())
    }

    async fn update_password(
        &self,
        user_id: &str,
        update: &PasswordUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.endpoint(&format!("/api/user/update/{}", user_id)))
            .json(update);
        self.send_raw(request).await.map(|_| ())
    }

    async fn user_info(&self, user_id: &str) -> Result<User, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/api/user/info/{}", user_id)));
        self.send(request).await
    }

    async fn balance(&self, user_id: &str) -> Result<Balances, ApiError> {
        let request = self
            .client
            .get(self.endpoint("/api/user/balance"))
            .query(&[("id", user_id)]);
        let envelope: BalanceEnvelope = self.send(request).await?;
        Ok(envelope.data)
    }

    async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        let request = self.client.get(self.endpoint("/api/plan/all"));
        self.send(request).await
    }

    async fn buy_plan(&self, purchase: &BuyPlan) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint("/api/user/buy-plan"))
            .json(purchase);
        self.send_raw(request).await.map(|_| ())
    }

    async fn investments(&self, user_id: &str) -> Result<Vec<Investment>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/api/user/plans/{}", user_id)));
        self.send(request).await
    }

    async fn deposits(&self, user_id: &str) -> Result<Vec<Deposit>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/api/user/deposits/{}", user_id)));
        self.send(request).await
    }

    async fn withdrawals(&self, user_id: &str) -> Result<Vec<Withdrawal>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/api/user/withdrawals/{}", user_id)));
        self.send(request).await
    }

    async fn gateway_deposit(&self, deposit: &NewDeposit) -> Result<GatewayDeposit, ApiError> {
        let request = self
            .client
            .post(self.endpoint("/api/gateway/deposit"))
            .json(deposit);
        self.send(request).await
    }

    async fn gateway_withdraw(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<GatewayWithdrawal, ApiError> {
        let request = self
            .client
            .post(self.endpoint("/api/gateway/withdraw"))
            .json(withdrawal);
        self.send(request).await
    }
}
