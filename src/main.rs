use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{future::Future, path::Path, path::PathBuf, sync::Arc, time::Duration};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

mod models;
mod repositories;
pub mod services;
pub mod settings;

use chrono::{DateTime, Utc};
use models::{pix::PixKeyType, plans::Investment, transactions::Cents};
use repositories::{api::HttpApi, session::SessionRepository};
use services::{
    formatting::{format_cents, format_currency, format_reais},
    outcome::{Notification, Outcome},
    session::{Access, SessionContext},
    transactions::DEPOSIT_PRESETS,
    users::format_profile_phone,
    view::ViewState,
    ServiceError, ServiceManager,
};

#[derive(Parser)]
#[command(
    version,
    about = "Command line client for the Epiroc investment platform",
    long_about = None
)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        phone: String,
        #[arg(long)]
        password: String,
        /// Require an administrator account
        #[arg(long)]
        admin: bool,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Referral code or invite link
        #[arg(long)]
        invited_by: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the account balance
    Balance {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// List the plan catalog
    Plans,
    /// Buy a plan from the catalog
    BuyPlan { plan_id: i64 },
    /// List active investments
    Investments,
    /// Request a deposit
    Deposit {
        /// Amount as typed, digits read as centavos ("8000" is R$ 80,00)
        #[arg(required_unless_present = "preset")]
        amount: Option<String>,
        /// One of the quick-pick amounts, in reais
        #[arg(long, value_parser = parse_preset)]
        preset: Option<u64>,
    },
    /// Request a withdrawal to a PIX key
    Withdraw {
        /// Amount as typed, digits read as centavos ("2000" is R$ 20,00)
        amount: String,
        #[arg(long)]
        key_type: Option<PixKeyType>,
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Deposit history
    Deposits,
    /// Withdrawal history
    Withdrawals,
    /// Phone, balance and VIP tier
    Profile,
    /// Referral link and statistics
    Referral,
    /// Change the account password
    ChangePassword {
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Confirm the change
        #[arg(long)]
        yes: bool,
    },
}

fn parse_preset(value: &str) -> Result<u64, String> {
    let preset: u64 = value.parse().map_err(|_| format!("Invalid preset: {}", value))?;
    if DEPOSIT_PRESETS.contains(&preset) {
        Ok(preset)
    } else {
        Err(format!("Preset must be one of {:?}", DEPOSIT_PRESETS))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_logging(&args.log4rs)?;
    let settings = settings::Settings::load(&args.config)?;
    log::debug!("Using API at {}", settings.api.url);

    let session_path = match &settings.session.path {
        Some(path) => PathBuf::from(path),
        None => SessionRepository::default_path().ok_or_else(|| {
            anyhow::anyhow!("Could not determine a data directory for the session.")
        })?,
    };
    let mut session = SessionContext::load(SessionRepository::new(session_path))?;

    let api = Arc::new(HttpApi::new(
        settings.api.url.clone(),
        Duration::from_secs(settings.api.timeout_secs),
    ));
    let manager = services::start_services(api, &settings);

    match args.command {
        Command::Login {
            phone,
            password,
            admin,
        } => match manager.login(phone, password, admin).await {
            Ok((new_session, outcome)) => {
                session.save(new_session)?;
                report(outcome);
            }
            Err(e) => report_error(e),
        },
        Command::Register {
            phone,
            password,
            confirm_password,
            invited_by,
        } => report_result(
            manager
                .register(phone, password, confirm_password, invited_by)
                .await,
        ),
        Command::Logout => {
            session.clear()?;
            report(Outcome::notify(Notification::info("Sessão encerrada.")));
        }
        command => {
            let user_id = match session.guard() {
                Access::Granted { user_id, .. } => user_id,
                Access::Redirect(route) => {
                    println!("{}", Notification::error("Faça login para continuar."));
                    println!("-> {}", route);
                    return Ok(());
                }
            };
            run_guarded(&manager, user_id, command).await;
        }
    }

    Ok(())
}

async fn run_guarded(manager: &ServiceManager, user_id: String, command: Command) {
    match command {
        Command::Balance { watch: false } => match manager.balance(&user_id).await {
            Ok(balances) => print_balance(&balances),
            Err(e) => report_error(e),
        },
        Command::Balance { watch: true } => {
            let ctrl_c = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            watch_balance(manager, user_id, BufReader::new(tokio::io::stdin()), ctrl_c).await
        }
        Command::Plans => {
            let mut plans = ViewState::new(Vec::new());
            plans.settle(manager.plans().await, "plans");
            for plan in plans.get() {
                println!(
                    "#{:<4} {:<20} {:>14}  {} dias  lucro {}/dia{}",
                    plan.id,
                    plan.name,
                    format_reais(plan.price),
                    plan.duration,
                    format_reais(plan.daily_roi_reais()),
                    if plan.status { "" } else { "  (indisponível)" }
                );
            }
        }
        Command::BuyPlan { plan_id } => match manager.buy_plan(user_id, plan_id).await {
            Ok(purchase) => {
                let notification = if purchase.dialog.is_success() {
                    Notification::success(purchase.dialog.title())
                } else {
                    Notification::error(purchase.dialog.title())
                };
                println!("{}", notification);
                println!("{}", purchase.dialog.description());
                if let Some(balances) = purchase.balances {
                    print_balance(&balances);
                }
            }
            Err(e) => report_error(e),
        },
        Command::Investments => {
            let mut investments = ViewState::new(Vec::new());
            investments.settle(manager.investments(user_id).await, "investments");
            let now = Utc::now();
            for investment in investments.get() {
                println!("{}", investment_line(investment, now));
            }
        }
        Command::Deposit { amount, preset } => {
            let amount = match preset {
                Some(reais) => (reais * 100).to_string(),
                None => amount.unwrap_or_default(),
            };
            println!("Valor: {}", format_currency(&amount));
            report_result(manager.deposit(user_id, amount).await);
        }
        Command::Withdraw {
            amount,
            key_type,
            key,
        } => {
            println!("Valor: {}", format_currency(&amount));
            if let Some(kind) = key_type {
                println!("Chave PIX: {}", services::pix::format_key(kind, &key));
            }
            report_result(manager.withdraw(user_id, amount, key_type, key).await);
        }
        Command::Deposits => {
            let mut deposits = ViewState::new(Vec::new());
            deposits.settle(manager.deposits(user_id).await, "deposits");
            for deposit in deposits.get() {
                println!(
                    "{}  {:>14}  {}",
                    deposit.created_at.format("%d/%m/%Y"),
                    format_cents(deposit.amount),
                    deposit.status.label()
                );
            }
        }
        Command::Withdrawals => {
            let mut withdrawals = ViewState::new(Vec::new());
            withdrawals.settle(manager.withdrawals(user_id).await, "withdrawals");
            for withdrawal in withdrawals.get() {
                println!(
                    "{}  {:>14}  {}",
                    withdrawal.created_at.format("%d/%m/%Y"),
                    format_cents(withdrawal.amount),
                    withdrawal.status.label()
                );
            }
        }
        Command::Profile => {
            let mut user = ViewState::new(Default::default());
            user.settle(manager.user(user_id).await, "user");
            let user: &models::users::User = user.get();
            println!("Telefone: {}", format_profile_phone(&user.phone));
            println!("Saldo:    {}", format_reais(user.balance));
            println!("Nível:    {}", user.vip_type);
        }
        Command::Referral => match manager.referral(user_id).await {
            Ok(referral) => {
                println!("Link:         {}", referral.link);
                println!("Nível:        {}", referral.vip_type);
                println!("Indicados:    {}", referral.count);
                println!("Bônus:        {}", format_reais(referral.bonus));
                println!("Investimentos:{:>14}", format_reais(referral.investments));
                println!("Depósitos:    {}", format_reais(referral.deposits));
            }
            Err(e) => log::error!("Could not fetch referral data: {}", e),
        },
        Command::ChangePassword {
            password,
            confirm_password,
            yes,
        } => report_result(
            manager
                .change_password(user_id, password, confirm_password, yes)
                .await,
        ),
        Command::Login { .. } | Command::Register { .. } | Command::Logout => {}
    }
}

async fn watch_balance<R>(
    manager: &ServiceManager,
    user_id: String,
    input: R,
    shutdown: impl Future<Output = ()>,
) where
    R: AsyncBufRead + Unpin,
{
    let poller = manager.poll_balance(user_id);
    let mut updates = poller.subscribe();
    let mut lines = input.lines();
    let mut input_open = true;
    tokio::pin!(shutdown);
    println!("[*] Atualizando a cada intervalo. Enter atualiza agora, Ctrl-C encerra.");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let (balances, stale) = {
                    let view = updates.borrow_and_update();
                    (*view.get(), view.is_stale())
                };
                print_balance(&balances);
                if stale {
                    println!("(saldo pode estar desatualizado)");
                }
            }
            // A closed stdin only disables manual refresh.
            line = lines.next_line(), if input_open => match line {
                Ok(Some(_)) => poller.refresh(),
                Ok(None) => input_open = false,
                Err(e) => {
                    log::debug!("Stopped reading input: {}", e);
                    input_open = false;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    poller.stop().await;
}

fn investment_line(investment: &Investment, now: DateTime<Utc>) -> String {
    format!(
        "{:<20} {:>14}  termina em {}  {} dias restantes",
        investment.plan.name,
        format_reais(investment.price),
        investment.end_date.format("%d/%m/%Y"),
        investment.remaining_days(now).max(0)
    )
}

fn print_balance(balances: &models::users::Balances) {
    println!(
        "Saldo: {}  (disponível para saque: {})",
        format_reais(balances.balance),
        format_cents(Cents::from_reais(balances.withdrawal_balance))
    );
}

fn report(outcome: Outcome) {
    if let Some(notification) = outcome.notification {
        println!("{}", notification);
    }
    if let Some(route) = outcome.redirect {
        println!("-> {}", route);
    }
}

fn report_error(error: ServiceError) {
    if let ServiceError::Communication(..) = error {
        log::error!("{}", error);
    }
    println!("{}", Notification::error(error.to_string()));
}

fn report_result(result: Result<Outcome, ServiceError>) {
    match result {
        Ok(outcome) => report(outcome),
        Err(e) => report_error(e),
    }
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    use log::LevelFilter;
    use log4rs::{
        append::console::{ConsoleAppender, Target},
        config::{Appender, Config, Root},
        encode::pattern::PatternEncoder,
    };

    if Path::new(path).exists() {
        return log4rs::init_file(path, Default::default())
            .map_err(|e| anyhow::anyhow!("Could not initialize logging: {}", e));
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;

    log4rs::init_config(config)?;
    Ok(())
}
