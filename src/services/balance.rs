use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use super::{view::ViewState, ServiceError};
use crate::{models::users::Balances, repositories::api::PlatformApi};

pub async fn fetch_balance(
    api: &dyn PlatformApi,
    user_id: &str,
) -> Result<Balances, ServiceError> {
    api.balance(user_id)
        .await
        .map_err(ServiceError::api("Erro ao buscar saldo"))
}

/// Keeps a balance view fresh: one fetch on start, then one per interval,
/// plus any requested through [`PollerHandle::refresh`].
pub struct BalancePoller {
    api: Arc<dyn PlatformApi>,
    user_id: String,
    interval: Duration,
}

pub struct PollerHandle {
    balances: watch::Receiver<ViewState<Balances>>,
    refresh: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl BalancePoller {
    pub fn new(api: Arc<dyn PlatformApi>, user_id: String, interval: Duration) -> Self {
        BalancePoller {
            api,
            user_id,
            interval,
        }
    }

    pub fn start(self) -> PollerHandle {
        let (view_tx, view_rx) = watch::channel(ViewState::new(Balances::default()));
        let (refresh_tx, mut refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {}
                    Some(()) = refresh_rx.recv() => {
                        log::debug!("Manual balance refresh for user {}", self.user_id);
                    }
                }

                // An in-flight fetch is dropped on shutdown so its result can
                // never land after the handle is stopped.
                let result = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    result = fetch_balance(self.api.as_ref(), &self.user_id) => result,
                };

                if *shutdown_rx.borrow() {
                    break;
                }

                view_tx.send_if_modified(|view| view.settle(result, "balance"));
            }

            log::debug!("Balance poller for user {} stopped.", self.user_id);
        });

        log::info!("Balance poller started, every {:?}", period);

        PollerHandle {
            balances: view_rx,
            refresh: refresh_tx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<ViewState<Balances>> {
        self.balances.clone()
    }

    pub fn latest(&self) -> Balances {
        *self.balances.borrow().get()
    }

    /// Out-of-band fetch. Dropped when a refresh is already queued.
    pub fn refresh(&self) {
        let _ = self.refresh.try_send(());
    }

    /// Stops the timer and waits for the task, discarding any fetch still in
    /// flight. No update is published once this returns.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Balance poller ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::api::fake::FakeApi;

    fn balances(balance: f64) -> Balances {
        Balances {
            balance,
            withdrawal_balance: 0.0,
        }
    }

    fn fake(queue: Vec<Result<Balances, u16>>, delay: Option<Duration>) -> Arc<FakeApi> {
        Arc::new(FakeApi {
            balances: std::sync::Mutex::new(queue),
            balance_delay: delay,
            ..Default::default()
        })
    }

    fn poller(api: &Arc<FakeApi>) -> PollerHandle {
        BalancePoller::new(api.clone(), "42".to_string(), Duration::from_secs(30)).start()
    }

    fn balance_calls(api: &FakeApi) -> usize {
        api.calls().iter().filter(|c| c.starts_with("balance:")).count()
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_on_start_and_every_interval() {
        let api = fake(
            vec![Ok(balances(10.0)), Ok(balances(20.0)), Ok(balances(30.0))],
            None,
        );
        let handle = poller(&api);
        let mut updates = handle.subscribe();

        updates.changed().await.unwrap();
        assert_eq!(handle.latest(), balances(10.0));
        assert_eq!(api.calls()[0], "balance:42");

        tokio::time::sleep(Duration::from_secs(30)).await;
        updates.changed().await.unwrap();
        assert_eq!(handle.latest(), balances(20.0));
        assert_eq!(balance_calls(&api), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_update_after_stop() {
        let api = fake(vec![Ok(balances(10.0)), Ok(balances(99.0))], None);
        let handle = poller(&api);
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(balance_calls(&api), 1);
        assert!(!updates.has_changed().unwrap_or(false));
        assert_eq!(*updates.borrow().get(), balances(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_fetch_is_discarded_on_stop() {
        let api = fake(vec![Ok(balances(10.0))], Some(Duration::from_secs(5)));
        let handle = poller(&api);
        let updates = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(balance_calls(&api), 1);
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*updates.borrow().get(), Balances::default());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_previous_balance() {
        let api = fake(vec![Ok(balances(10.0)), Err(500), Ok(balances(30.0))], None);
        let handle = poller(&api);
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(balance_calls(&api), 2);
        assert_eq!(handle.latest(), balances(10.0));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_published_as_stale() {
        let api = fake(vec![Ok(balances(10.0)), Err(500), Ok(balances(30.0))], None);
        let handle = poller(&api);
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();
        assert!(!updates.borrow_and_update().is_stale());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(updates.has_changed().unwrap());
        {
            let view = updates.borrow_and_update();
            assert!(view.is_stale());
            assert_eq!(*view.get(), balances(10.0));
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        updates.changed().await.unwrap();
        assert!(!updates.borrow().is_stale());
        assert_eq!(handle.latest(), balances(30.0));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_fetches_out_of_band() {
        let api = fake(vec![Ok(balances(10.0)), Ok(balances(15.0))], None);
        let handle = poller(&api);
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.refresh();
        updates.changed().await.unwrap();

        assert_eq!(handle.latest(), balances(15.0));
        assert_eq!(balance_calls(&api), 2);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn queued_refreshes_collapse_into_one() {
        let api = fake(vec![Ok(balances(10.0))], None);
        let handle = poller(&api);
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();

        handle.refresh();
        handle.refresh();
        handle.refresh();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(balance_calls(&api), 2);
        handle.stop().await;
    }
}
