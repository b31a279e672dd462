use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::{balance::fetch_balance, outcome::Dialog, RequestHandler, Service, ServiceError};
use crate::{
    models::{
        plans::{BuyPlan, Investment, Plan},
        users::Balances,
    },
    repositories::api::PlatformApi,
};

pub enum PlanRequest {
    ListPlans {
        response: oneshot::Sender<Result<Vec<Plan>, ServiceError>>,
    },
    ListInvestments {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Investment>, ServiceError>>,
    },
    BuyPlan {
        user_id: String,
        plan_id: i64,
        response: oneshot::Sender<Purchase>,
    },
}

/// What the dashboard shows after a purchase attempt.
#[derive(Clone, Debug)]
pub struct Purchase {
    pub dialog: Dialog,
    /// Balance re-fetched after a successful purchase, when that fetch worked.
    pub balances: Option<Balances>,
}

#[derive(Clone)]
pub struct PlanRequestHandler {
    api: Arc<dyn PlatformApi>,
}

impl PlanRequestHandler {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        PlanRequestHandler { api }
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>, ServiceError> {
        self.api
            .plans()
            .await
            .map_err(ServiceError::api("Erro ao buscar planos"))
    }

    pub async fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>, ServiceError> {
        self.api
            .investments(user_id)
            .await
            .map_err(ServiceError::api("Erro ao buscar investimentos"))
    }

    pub async fn buy_plan(&self, user_id: &str, plan_id: i64) -> Purchase {
        let purchase = BuyPlan {
            user_id: user_id.to_string(),
            plan_id,
        };

        if let Err(e) = self.api.buy_plan(&purchase).await {
            log::warn!("User {} could not buy plan {}: {}", user_id, plan_id, e);
            return Purchase {
                dialog: Dialog::PlanPurchaseFailed,
                balances: None,
            };
        }

        log::info!("User {} bought plan {}", user_id, plan_id);
        let balances = match fetch_balance(self.api.as_ref(), user_id).await {
            Ok(balances) => Some(balances),
            Err(e) => {
                log::error!("Could not refresh balance after purchase: {}", e);
                None
            }
        };

        Purchase {
            dialog: Dialog::PlanPurchased,
            balances,
        }
    }
}

#[async_trait]
impl RequestHandler<PlanRequest> for PlanRequestHandler {
    async fn handle_request(&self, request: PlanRequest) {
        match request {
            PlanRequest::ListPlans { response } => {
                let _ = response.send(self.list_plans().await);
            }
            PlanRequest::ListInvestments { user_id, response } => {
                let _ = response.send(self.list_investments(&user_id).await);
            }
            PlanRequest::BuyPlan {
                user_id,
                plan_id,
                response,
            } => {
                let _ = response.send(self.buy_plan(&user_id, plan_id).await);
            }
        }
    }
}

pub struct PlanService;

impl PlanService {
    pub fn new() -> Self {
        PlanService {}
    }
}

#[async_trait]
impl Service<PlanRequest, PlanRequestHandler> for PlanService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::api::fake::FakeApi;

    #[tokio::test]
    async fn purchase_refreshes_balance() {
        let api = Arc::new(FakeApi {
            balances: std::sync::Mutex::new(vec![Ok(Balances {
                balance: 50.0,
                withdrawal_balance: 10.0,
            })]),
            ..Default::default()
        });
        let purchase = PlanRequestHandler::new(api.clone()).buy_plan("42", 3).await;

        assert_eq!(purchase.dialog, Dialog::PlanPurchased);
        assert_eq!(purchase.balances.unwrap().balance, 50.0);
        assert_eq!(api.calls(), vec!["buy_plan", "balance:42"]);
        assert_eq!(
            api.last_body().unwrap(),
            serde_json::json!({"userId": "42", "planId": 3})
        );
    }

    #[tokio::test]
    async fn failed_purchase_opens_error_dialog_without_refresh() {
        let api = Arc::new(FakeApi {
            fail_with: Some((400, Some("Saldo insuficiente".to_string()))),
            ..Default::default()
        });
        let purchase = PlanRequestHandler::new(api.clone()).buy_plan("42", 3).await;

        assert_eq!(purchase.dialog, Dialog::PlanPurchaseFailed);
        assert!(!purchase.dialog.is_success());
        assert!(purchase.balances.is_none());
        assert_eq!(api.calls(), vec!["buy_plan"]);
    }

    #[tokio::test]
    async fn catalog_is_decoded() {
        let api = Arc::new(FakeApi::default());
        let plans = PlanRequestHandler::new(api).list_plans().await.unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].daily_roi_reais(), 12.5);
    }
}
