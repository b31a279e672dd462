use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::{
    formatting::digits,
    outcome::{Notification, Outcome, Route},
    RequestHandler, Service, ServiceError,
};
use crate::{
    models::{
        referrals::Referral,
        session::Session,
        users::{Credentials, NewUser, PasswordUpdate, User},
    },
    repositories::api::PlatformApi,
};

const COUNTRY_CODE: &str = "55";
const NATIONAL_DIGITS: usize = 11;

pub enum UserRequest {
    Login {
        phone: String,
        password: String,
        admin: bool,
        response: oneshot::Sender<Result<(Session, Outcome), ServiceError>>,
    },
    Register {
        phone: String,
        password: String,
        confirm_password: String,
        invited_by: Option<String>,
        response: oneshot::Sender<Result<Outcome, ServiceError>>,
    },
    ChangePassword {
        user_id: String,
        password: String,
        confirm_password: String,
        confirmed: bool,
        response: oneshot::Sender<Result<Outcome, ServiceError>>,
    },
    GetUser {
        id: String,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    GetReferral {
        id: String,
        response: oneshot::Sender<Result<Referral, ServiceError>>,
    },
}

/// Digits of a phone number with the Brazilian country code dropped when it
/// precedes a full national number.
pub fn national_phone(phone: &str) -> String {
    let digits = digits(phone);
    match digits.strip_prefix(COUNTRY_CODE) {
        Some(national) if national.len() >= NATIONAL_DIGITS => national.to_string(),
        _ => digits,
    }
}

/// `(XX) XXXXX-XXXX` for profile display; shorter numbers are left bare.
pub fn format_profile_phone(phone: &str) -> String {
    let national = national_phone(phone);
    if national.len() < NATIONAL_DIGITS {
        return national;
    }

    format!(
        "({}) {}-{}{}",
        &national[..2],
        &national[2..7],
        &national[7..11],
        &national[11..]
    )
}

/// Accepts either a bare referral code or an invite link carrying `r=`.
pub fn referral_code(input: &str) -> Option<String> {
    let input = input.trim();
    let code = match input.split_once("r=") {
        Some((_, rest)) => rest.split('&').next().unwrap_or_default(),
        None => input,
    };

    (!code.is_empty()).then(|| code.to_string())
}

#[derive(Clone)]
pub struct UserRequestHandler {
    api: Arc<dyn PlatformApi>,
    referral_link_base: String,
}

impl UserRequestHandler {
    pub fn new(api: Arc<dyn PlatformApi>, referral_link_base: String) -> Self {
        UserRequestHandler {
            api,
            referral_link_base,
        }
    }

    /// Returns the session to persist; nothing is returned on a denied login.
    pub async fn login(
        &self,
        phone: &str,
        password: &str,
        admin: bool,
    ) -> Result<(Session, Outcome), ServiceError> {
        if phone.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Por favor, preencha todos os campos.".to_string(),
            ));
        }

        let credentials = Credentials {
            phone: national_phone(phone),
            password: password.to_string(),
        };
        let response = self
            .api
            .login(&credentials)
            .await
            .map_err(ServiceError::api(if admin {
                "Erro ao fazer login"
            } else {
                "Credenciais inválidas"
            }))?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ServiceError::Rejected("Ocorreu um erro ao fazer login.".to_string())
            })?;

        if admin && !response.user.map(|user| user.is_admin).unwrap_or(false) {
            log::warn!("Non-admin user {} tried the admin login.", response.id);
            return Err(ServiceError::Rejected(
                "Acesso negado. Você não tem permissões de administrador.".to_string(),
            ));
        }

        log::info!("User {} logged in.", response.id);
        let route = if admin {
            Route::AdminDashboard
        } else {
            Route::Dashboard
        };

        Ok((
            Session::new(token, response.id),
            Outcome::notify(Notification::success("Login realizado com sucesso!"))
                .redirect_to(route),
        ))
    }

    pub async fn register(
        &self,
        phone: &str,
        password: &str,
        confirm_password: &str,
        invited_by: Option<&str>,
    ) -> Result<Outcome, ServiceError> {
        if phone.trim().is_empty() || password.is_empty() || confirm_password.is_empty() {
            return Err(ServiceError::Validation(
                "Por favor, preencha todos os campos obrigatórios.".to_string(),
            ));
        }
        if password != confirm_password {
            return Err(ServiceError::Validation("As senhas não coincidem.".to_string()));
        }

        let user = NewUser {
            phone: digits(phone),
            password: password.to_string(),
            invited_by: invited_by.and_then(referral_code),
        };
        self.api
            .register(&user)
            .await
            .map_err(ServiceError::api("Erro ao realizar cadastro"))?;

        log::info!(
            "Registered {} (invited by {})",
            user.phone,
            user.invited_by.as_deref().unwrap_or("nobody")
        );
        Ok(
            Outcome::notify(Notification::success("Cadastro realizado com sucesso."))
                .redirect_to(Route::Login),
        )
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        password: &str,
        confirm_password: &str,
        confirmed: bool,
    ) -> Result<Outcome, ServiceError> {
        if password.is_empty() || confirm_password.is_empty() {
            return Err(ServiceError::Validation("Preencha todos os campos".to_string()));
        }
        if password != confirm_password {
            return Err(ServiceError::Validation("As senhas não coincidem".to_string()));
        }
        if !confirmed {
            return Err(ServiceError::Validation(
                "Você precisa confirmar a troca de senha".to_string(),
            ));
        }

        self.api
            .update_password(
                user_id,
                &PasswordUpdate {
                    password: password.to_string(),
                },
            )
            .await
            .map_err(ServiceError::api("Erro ao atualizar senha"))?;

        Ok(Outcome::notify(Notification::success("Senha atualizada com sucesso!")))
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.api
            .user_info(id)
            .await
            .map_err(ServiceError::api("Erro ao buscar usuário"))
    }

    pub async fn get_referral(&self, id: &str) -> Result<Referral, ServiceError> {
        let user = self.get_user(id).await?;
        Ok(Referral::from_user(&user, &self.referral_link_base))
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::Login {
                phone,
                password,
                admin,
                response,
            } => {
                let _ = response.send(self.login(&phone, &password, admin).await);
            }
            UserRequest::Register {
                phone,
                password,
                confirm_password,
                invited_by,
                response,
            } => {
                let result = self
                    .register(&phone, &password, &confirm_password, invited_by.as_deref())
                    .await;
                let _ = response.send(result);
            }
            UserRequest::ChangePassword {
                user_id,
                password,
                confirm_password,
                confirmed,
                response,
            } => {
                let result = self
                    .change_password(&user_id, &password, &confirm_password, confirmed)
                    .await;
                let _ = response.send(result);
            }
            UserRequest::GetUser { id, response } => {
                let _ = response.send(self.get_user(&id).await);
            }
            UserRequest::GetReferral { id, response } => {
                let _ = response.send(self.get_referral(&id).await);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::api::fake::FakeApi;

    fn handler(api: &Arc<FakeApi>) -> UserRequestHandler {
        UserRequestHandler::new(api.clone(), "https://epiroc.lat/".to_string())
    }

    #[test]
    fn country_code_is_dropped_only_before_a_full_number() {
        assert_eq!(national_phone("+55 (11) 98765-4321"), "11987654321");
        assert_eq!(national_phone("(55) 98765-4321"), "55987654321");
        assert_eq!(national_phone("11 98765-4321"), "11987654321");
    }

    #[test]
    fn profile_phone_is_masked() {
        assert_eq!(format_profile_phone("5511987654321"), "(11) 98765-4321");
        assert_eq!(format_profile_phone("1198765"), "1198765");
    }

    #[test]
    fn referral_code_comes_from_code_or_link() {
        assert_eq!(referral_code("ABC123"), Some("ABC123".to_string()));
        assert_eq!(
            referral_code("https://epiroc.lat/auth/register?r=XYZ&utm=1"),
            Some("XYZ".to_string())
        );
        assert_eq!(referral_code("  "), None);
        assert_eq!(referral_code("https://epiroc.lat/auth/register?r="), None);
    }

    #[tokio::test]
    async fn login_sends_national_number_and_returns_session() {
        let api = Arc::new(FakeApi::default());
        let (session, outcome) = handler(&api)
            .login("+55 11 98765-4321", "secret", false)
            .await
            .unwrap();

        assert_eq!(session, Session::new("tkn".to_string(), "42".to_string()));
        assert_eq!(outcome.redirect, Some(Route::Dashboard));
        assert_eq!(
            api.last_body().unwrap(),
            serde_json::json!({"phone": "11987654321", "password": "secret"})
        );
    }

    #[tokio::test]
    async fn admin_login_requires_admin_flag() {
        let api = Arc::new(FakeApi {
            login_response: Some(serde_json::json!({
                "token": "tkn", "id": 5, "user": {"is_admin": false}
            })),
            ..Default::default()
        });
        let err = handler(&api).login("11987654321", "pw", true).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));

        let api = Arc::new(FakeApi {
            login_response: Some(serde_json::json!({
                "token": "tkn", "id": "5", "user": {"is_admin": true}
            })),
            ..Default::default()
        });
        let (session, outcome) = handler(&api).login("11987654321", "pw", true).await.unwrap();
        assert_eq!(session.id.as_deref(), Some("5"));
        assert_eq!(outcome.redirect, Some(Route::AdminDashboard));
    }

    #[tokio::test]
    async fn login_without_token_is_rejected() {
        let api = Arc::new(FakeApi {
            login_response: Some(serde_json::json!({"id": 5})),
            ..Default::default()
        });
        assert!(handler(&api).login("11987654321", "pw", false).await.is_err());
    }

    #[tokio::test]
    async fn empty_fields_never_reach_the_api() {
        let api = Arc::new(FakeApi::default());
        let handler = handler(&api);

        assert!(handler.login("", "pw", false).await.is_err());
        assert!(handler.register("11987654321", "a", "b", None).await.is_err());
        assert!(handler.register("11987654321", "a", "", None).await.is_err());
        assert!(handler.change_password("42", "a", "a", false).await.is_err());
        assert!(handler.change_password("42", "a", "b", true).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn register_carries_the_referral_code() {
        let api = Arc::new(FakeApi::default());
        let outcome = handler(&api)
            .register("(11) 98765-4321", "pw", "pw", Some("https://epiroc.lat/auth/register?r=XYZ"))
            .await
            .unwrap();

        assert_eq!(outcome.redirect, Some(Route::Login));
        assert_eq!(
            api.last_body().unwrap(),
            serde_json::json!({"phone": "11987654321", "password": "pw", "invited_by": "XYZ"})
        );
    }

    #[tokio::test]
    async fn referral_link_uses_the_user_code() {
        let api = Arc::new(FakeApi::default());
        let referral = handler(&api).get_referral("42").await.unwrap();

        assert_eq!(referral.link, "https://epiroc.lat/auth/register?r=ABC123");
        assert_eq!(referral.count, 2);
        assert_eq!(referral.vip_type.to_string(), "VIP 0");
    }

    #[tokio::test]
    async fn password_change_reports_api_message() {
        let api = Arc::new(FakeApi {
            fail_with: Some((404, Some("Usuário não encontrado".to_string()))),
            ..Default::default()
        });
        let err = handler(&api)
            .change_password("42", "new", "new", true)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Usuário não encontrado");
        assert_eq!(api.calls(), vec!["update_password:42"]);
    }
}
