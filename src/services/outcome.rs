use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

/// Transient message shown after an action, the CLI's toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "[SUCCESS]",
            Level::Info => "[*]",
            Level::Error => "[ERROR]",
        };
        write!(f, "{} {}", tag, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    AdminDashboard,
    Withdrawals,
    Release,
    External(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::AdminDashboard => "/admin/dashboard",
            Route::Withdrawals => "/withdrawals",
            Route::Release => "/realease",
            Route::External(url) => url.as_str(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result dialog of a plan purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialog {
    PlanPurchased,
    PlanPurchaseFailed,
}

impl Dialog {
    pub fn title(&self) -> &'static str {
        match self {
            Dialog::PlanPurchased => "Plano adquirido com sucesso!",
            Dialog::PlanPurchaseFailed => "Erro ao adquirir o plano",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Dialog::PlanPurchased => {
                "Aguarde os rendimentos começarem a ser creditados na sua carteira de investimentos toda 00h00."
            }
            Dialog::PlanPurchaseFailed => {
                "Ocorreu um erro ao adquirir o plano. Por favor, tente novamente."
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Dialog::PlanPurchased)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notification: Option<Notification>,
    pub redirect: Option<Route>,
}

impl Outcome {
    pub fn notify(notification: Notification) -> Self {
        Outcome {
            notification: Some(notification),
            redirect: None,
        }
    }

    pub fn redirect_to(mut self, route: Route) -> Self {
        self.redirect = Some(route);
        self
    }
}
