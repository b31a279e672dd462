use crate::{models::session::Session, repositories::session::SessionRepository};

use super::outcome::Route;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Granted { token: String, user_id: String },
    Redirect(Route),
}

/// Explicit owner of the persisted session. Everything that needs the token
/// or user id gets it from here, never from ambient state.
pub struct SessionContext {
    repository: SessionRepository,
    current: Session,
}

impl SessionContext {
    pub fn load(repository: SessionRepository) -> Result<Self, anyhow::Error> {
        let current = repository.load()?;
        log::debug!("Session loaded from {}", repository.path().display());

        Ok(SessionContext {
            repository,
            current,
        })
    }

    pub fn current(&self) -> &Session {
        &self.current
    }

    pub fn save(&mut self, session: Session) -> Result<(), anyhow::Error> {
        self.repository.save(&session)?;
        self.current = session;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), anyhow::Error> {
        self.repository.clear()?;
        self.current = Session::default();
        Ok(())
    }

    /// Presence check only: values are neither validated nor refreshed.
    pub fn guard(&self) -> Access {
        guard(&self.current)
    }
}

pub fn guard(session: &Session) -> Access {
    let present = |value: &Option<String>| value.as_ref().filter(|v| !v.is_empty()).cloned();

    match (present(&session.token), present(&session.id)) {
        (Some(token), Some(user_id)) => Access::Granted { token, user_id },
        _ => {
            log::info!("No stored session, redirecting to login.");
            Access::Redirect(Route::Login)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::session::scratch_path;

    fn session(token: Option<&str>, id: Option<&str>) -> Session {
        Session {
            token: token.map(str::to_string),
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn redirects_to_login_when_either_identifier_is_missing() {
        for missing in [
            session(None, Some("1")),
            session(Some("t"), None),
            session(None, None),
            session(Some(""), Some("1")),
            session(Some("t"), Some("")),
        ] {
            assert_eq!(guard(&missing), Access::Redirect(Route::Login));
        }
        assert_eq!(Route::Login.path(), "/");
    }

    #[test]
    fn any_present_values_are_accepted() {
        assert_eq!(
            guard(&session(Some("garbage"), Some("not-a-number"))),
            Access::Granted {
                token: "garbage".to_string(),
                user_id: "not-a-number".to_string()
            }
        );
    }

    #[test]
    fn context_lifecycle_persists_between_loads() {
        let path = scratch_path("context-lifecycle");
        let mut context = SessionContext::load(SessionRepository::new(path.clone())).unwrap();
        assert_eq!(context.guard(), Access::Redirect(Route::Login));

        context
            .save(Session::new("tkn".to_string(), "7".to_string()))
            .unwrap();

        let reloaded = SessionContext::load(SessionRepository::new(path.clone())).unwrap();
        assert!(matches!(reloaded.guard(), Access::Granted { ref user_id, .. } if user_id == "7"));

        context.clear().unwrap();
        let reloaded = SessionContext::load(SessionRepository::new(path)).unwrap();
        assert_eq!(reloaded.current(), &Session::default());
    }
}
