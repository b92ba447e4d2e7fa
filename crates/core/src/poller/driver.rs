//! Runs a [`TrainPoller`] on tokio.
//!
//! One task owns the poller, the timer and the snapshot sender. Lifecycle
//! and coordinate events come in from [`PollerHandle`]; fetches run as
//! separate tasks and report back, so a slow request never holds up the
//! timer.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nearby_trains_transit::{Coordinate, TrainFeed};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace};

use crate::config::{ConfigError, PollerConfig};
use crate::poller::machine::TrainPoller;
use crate::poller::snapshot::TrainSnapshot;
use crate::poller::state::{AppState, PollerCommand, PollerEvent, PollerStats, RequestId};

struct FetchCompletion {
    request: RequestId,
    outcome: nearby_trains_transit::Result<nearby_trains_transit::TrainFeedResponse>,
}

pub struct PollerDriver {
    poller: TrainPoller,
    feed: Arc<dyn TrainFeed>,
    timer: Option<Interval>,
    events: mpsc::UnboundedReceiver<PollerEvent>,
    completions_tx: mpsc::UnboundedSender<FetchCompletion>,
    completions: mpsc::UnboundedReceiver<FetchCompletion>,
    snapshots: watch::Sender<TrainSnapshot>,
    stats: watch::Sender<PollerStats>,
}

impl PollerDriver {
    /// Spawn the driver on the current tokio runtime.
    pub fn spawn(
        feed: Arc<dyn TrainFeed>,
        config: &PollerConfig,
    ) -> Result<PollerHandle, ConfigError> {
        Self::spawn_on(&tokio::runtime::Handle::current(), feed, config)
    }

    /// Spawn the driver on `runtime`.
    ///
    /// The config is validated first; a zero interval would leave the timer
    /// unable to tick.
    pub fn spawn_on(
        runtime: &tokio::runtime::Handle,
        feed: Arc<dyn TrainFeed>,
        config: &PollerConfig,
    ) -> Result<PollerHandle, ConfigError> {
        config.validate()?;

        let (events_tx, events) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(TrainSnapshot::default());
        let (stats, stats_rx) = watch::channel(PollerStats::default());

        let driver = PollerDriver {
            poller: TrainPoller::new(config),
            feed,
            timer: None,
            events,
            completions_tx,
            completions,
            snapshots,
            stats,
        };

        let task = runtime.spawn(driver.run());

        Ok(PollerHandle {
            events: events_tx,
            snapshots: snapshots_rx,
            stats: stats_rx,
            task,
        })
    }

    async fn run(mut self) {
        debug!("train poller started");

        loop {
            let event = tokio::select! {
                event = self.events.recv() => event.unwrap_or(PollerEvent::Shutdown),
                Some(completion) = self.completions.recv() => PollerEvent::FetchCompleted {
                    request: completion.request,
                    outcome: completion.outcome,
                    completed_at: Utc::now(),
                },
                _ = next_tick(&mut self.timer) => PollerEvent::Tick,
            };

            let shutting_down = matches!(event, PollerEvent::Shutdown);
            trace!("poller event: {event:?}");

            let commands = self.poller.handle_event(event);
            for command in commands {
                self.execute(command);
            }
            self.stats.send_replace(self.poller.stats());

            if shutting_down {
                break;
            }
        }

        info!("train poller stopped");
    }

    fn execute(&mut self, command: PollerCommand) {
        match command {
            PollerCommand::Fetch(request) => {
                let feed = Arc::clone(&self.feed);
                let completions = self.completions_tx.clone();
                tokio::spawn(async move {
                    let outcome = feed.fetch_all_trains().await;
                    // The driver may have shut down while this was in flight.
                    let _ = completions.send(FetchCompletion { request, outcome });
                });
            }
            PollerCommand::CancelTimer => {
                self.timer = None;
            }
            PollerCommand::ArmTimer(period) => {
                self.timer = Some(new_timer(period));
            }
            PollerCommand::Publish(snapshot) => {
                debug!(
                    "publishing {} trains (generation {})",
                    snapshot.len(),
                    snapshot.generation
                );
                self.snapshots.send_replace(snapshot);
            }
        }
    }
}

fn new_timer(period: Duration) -> Interval {
    // First tick one full period out; the immediate fetch already happened.
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

/// Owner-side handle to a running poller.
///
/// Dropping every handle stops the poller the same way [`PollerHandle::shutdown`] does.
pub struct PollerHandle {
    events: mpsc::UnboundedSender<PollerEvent>,
    snapshots: watch::Receiver<TrainSnapshot>,
    stats: watch::Receiver<PollerStats>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn set_app_state(&self, app_state: AppState) {
        self.send(PollerEvent::Lifecycle(app_state));
    }

    pub fn set_coordinate(&self, coordinate: Option<Coordinate>) {
        self.send(PollerEvent::CoordinateChanged(coordinate));
    }

    /// The latest published snapshot
    pub fn snapshot(&self) -> TrainSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrainSnapshot> {
        self.snapshots.clone()
    }

    pub fn stats(&self) -> PollerStats {
        *self.stats.borrow()
    }

    /// Stop polling and wait for the driver to exit.
    ///
    /// Fetches already in flight are left to finish on their own.
    pub async fn shutdown(self) {
        self.send(PollerEvent::Shutdown);
        let _ = self.task.await;
    }

    fn send(&self, event: PollerEvent) {
        if self.events.send(event).is_err() {
            debug!("poller already stopped; dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nearby_trains_transit::{
        FeedStep, Result, StaticTrainFeed, Train, TrainFeedResponse, TransitError,
    };
    use tokio::time::sleep;

    use super::*;

    fn line(pairs: &[(&str, f64, f64)]) -> TrainFeedResponse {
        pairs
            .iter()
            .map(|(id, lat, lon)| (id.to_string(), vec![Train::new(*id, *lat, *lon)]))
            .collect()
    }

    fn ids(snapshot: &TrainSnapshot) -> Vec<String> {
        snapshot.trains.iter().map(|t| t.train_id.to_string()).collect()
    }

    /// Let every ready task run without moving the clock meaningfully.
    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_while_active() {
        let feed = Arc::new(StaticTrainFeed::from_response(line(&[("A", 40.0, -74.0)])));
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();

        settle().await;
        assert_eq!(feed.request_count(), 0);

        handle.set_app_state(AppState::Active);
        settle().await;
        assert_eq!(feed.request_count(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(feed.request_count(), 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.request_count(), 2);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.request_count(), 3);

        assert_eq!(ids(&handle.snapshot()), ["A"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn background_pauses_polling() {
        let feed = Arc::new(StaticTrainFeed::from_response(line(&[("A", 40.0, -74.0)])));
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();

        handle.set_app_state(AppState::Active);
        sleep(Duration::from_secs(15)).await;
        assert_eq!(feed.request_count(), 2);

        handle.set_app_state(AppState::Background);
        sleep(Duration::from_secs(95)).await;
        assert_eq!(feed.request_count(), 2);

        handle.set_app_state(AppState::Active);
        settle().await;
        assert_eq!(feed.request_count(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_does_not_double_the_cadence() {
        let feed = Arc::new(StaticTrainFeed::from_response(line(&[("A", 40.0, -74.0)])));
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();

        handle.set_app_state(AppState::Active);
        sleep(Duration::from_secs(1)).await;
        handle.set_app_state(AppState::Active);
        sleep(Duration::from_secs(4)).await;
        assert_eq!(feed.request_count(), 2);

        // Timer re-armed at 1s: ticks at 11s, 21s, 31s
        sleep(Duration::from_secs(30)).await;
        assert_eq!(feed.request_count(), 5);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_last_snapshot_until_next_tick() {
        let feed = Arc::new(StaticTrainFeed::from_steps([
            FeedStep::Respond(line(&[("A", 40.0, -74.0), ("B", 41.0, -75.0)])),
            FeedStep::Fail(TransitError::Network("502 Bad Gateway".into())),
            FeedStep::Respond(line(&[("A", 40.5, -74.5), ("B", 40.11, -74.11)])),
        ]));
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();
        handle.set_coordinate(Some(Coordinate::new(40.1, -74.1)));
        handle.set_app_state(AppState::Active);

        settle().await;
        let first = handle.snapshot();
        assert_eq!(ids(&first), ["A", "B"]);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot(), first);
        assert_eq!(handle.snapshot().generation, first.generation);
        assert_eq!(handle.stats().fetches_failed, 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(ids(&handle.snapshot()), ["B", "A"]);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_published_change() {
        let feed = Arc::new(StaticTrainFeed::from_response(line(&[
            ("far", 47.6, -122.3),
            ("near", 40.0, -74.0),
        ])));
        let handle = PollerDriver::spawn(feed, &PollerConfig::default()).unwrap();
        let mut updates = handle.subscribe();

        handle.set_app_state(AppState::Active);
        updates.changed().await.unwrap();
        assert_eq!(ids(&updates.borrow_and_update()), ["far", "near"]);

        handle.set_coordinate(Some(Coordinate::new(40.1, -74.1)));
        updates.changed().await.unwrap();
        let sorted = updates.borrow_and_update().clone();
        assert_eq!(ids(&sorted), ["near", "far"]);
        assert!(sorted.sorted);

        handle.shutdown().await;
    }

    /// Feed whose n-th request takes `delays[n]` to answer.
    struct SlowFeed {
        delays: Vec<Duration>,
        responses: Vec<TrainFeedResponse>,
        calls: AtomicUsize,
        finished: Mutex<Vec<usize>>,
    }

    impl TrainFeed for SlowFeed {
        fn fetch_all_trains<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<TrainFeedResponse>> + Send + 'a>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                sleep(self.delays[call]).await;
                self.finished.lock().unwrap().push(call);
                Ok(self.responses[call].clone())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_fetches_resolve_last_write_wins() {
        let feed = Arc::new(SlowFeed {
            // The first request is still in flight when the second completes.
            delays: vec![Duration::from_secs(15), Duration::from_secs(1)],
            responses: vec![line(&[("old", 1.0, 1.0)]), line(&[("new", 2.0, 2.0)])],
            calls: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        });
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();

        handle.set_app_state(AppState::Active);
        sleep(Duration::from_secs(12)).await;
        assert_eq!(ids(&handle.snapshot()), ["new"]);

        handle.set_app_state(AppState::Background);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(feed.finished.lock().unwrap().as_slice(), [1, 0]);
        assert_eq!(ids(&handle.snapshot()), ["old"]);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_rejected_before_spawning() {
        let feed = Arc::new(StaticTrainFeed::default());
        let config = PollerConfig {
            interval_ms: 0,
            ..PollerConfig::default()
        };

        assert!(matches!(
            PollerDriver::spawn(feed.clone(), &config),
            Err(ConfigError::ZeroInterval)
        ));
        settle().await;
        assert_eq!(feed.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_driver() {
        let feed = Arc::new(StaticTrainFeed::default());
        let handle = PollerDriver::spawn(feed.clone(), &PollerConfig::default()).unwrap();
        handle.set_app_state(AppState::Active);
        settle().await;

        drop(handle);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(feed.request_count(), 1);
    }
}
