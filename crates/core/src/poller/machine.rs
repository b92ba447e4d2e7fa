//! Poll scheduling as a plain state machine.
//!
//! [`TrainPoller`] never sleeps, spawns or talks to the network. Each event
//! goes through [`TrainPoller::handle_event`], which answers with the
//! commands the caller has to carry out. Every activation cancels the armed
//! timer before arming a new one, so there is never more than one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nearby_trains_transit::{Coordinate, DistanceUnit, Result, Train, TrainFeedResponse};
use tracing::{debug, error, info};

use crate::config::PollerConfig;
use crate::poller::snapshot::{TrainSnapshot, arrange};
use crate::poller::state::{
    AppState, FetchOrdering, PollerCommand, PollerEvent, PollerState, PollerStats, RequestId,
};

pub struct TrainPoller {
    interval: Duration,
    unit: DistanceUnit,
    ordering: FetchOrdering,

    state: PollerState,
    app_state: AppState,
    timer_armed: bool,

    coordinate: Option<Coordinate>,
    /// Flattened trains of the last applied fetch, in feed order
    feed: Option<Vec<Train>>,
    snapshot: TrainSnapshot,

    next_request: u64,
    latest_request: Option<RequestId>,
    stats: PollerStats,
}

impl TrainPoller {
    pub fn new(config: &PollerConfig) -> Self {
        Self {
            interval: config.interval(),
            unit: config.distance_unit,
            ordering: config.fetch_ordering,
            state: PollerState::Idle,
            app_state: AppState::Unknown,
            timer_armed: false,
            coordinate: None,
            feed: None,
            snapshot: TrainSnapshot::default(),
            next_request: 0,
            latest_request: None,
            stats: PollerStats::default(),
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn snapshot(&self) -> &TrainSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> PollerStats {
        self.stats
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    pub fn handle_event(&mut self, event: PollerEvent) -> Vec<PollerCommand> {
        let mut commands = Vec::new();

        match event {
            PollerEvent::Lifecycle(app_state) => self.on_lifecycle(app_state, &mut commands),
            PollerEvent::Tick => self.on_tick(&mut commands),
            PollerEvent::CoordinateChanged(coordinate) => {
                self.on_coordinate(coordinate, &mut commands)
            }
            PollerEvent::FetchCompleted {
                request,
                outcome,
                completed_at,
            } => self.on_fetch_completed(request, outcome, completed_at, &mut commands),
            PollerEvent::Shutdown => {
                self.state = PollerState::Idle;
                self.cancel_timer(&mut commands);
            }
        }

        commands
    }

    fn on_lifecycle(&mut self, app_state: AppState, commands: &mut Vec<PollerCommand>) {
        let previous = self.app_state;
        self.app_state = app_state;

        if app_state.is_foreground() {
            if self.state == PollerState::Idle {
                info!("app became active; polling every {:?}", self.interval);
            } else {
                debug!("app re-activated while polling; re-arming timer");
            }
            self.start_polling(commands);
        } else if self.state == PollerState::Polling {
            info!("app left the foreground ({previous:?} -> {app_state:?}); polling stopped");
            self.state = PollerState::Idle;
            self.cancel_timer(commands);
        }
    }

    fn on_tick(&mut self, commands: &mut Vec<PollerCommand>) {
        if self.state == PollerState::Polling {
            self.issue_fetch(commands);
        } else {
            debug!("ignoring timer tick while idle");
        }
    }

    fn on_coordinate(&mut self, coordinate: Option<Coordinate>, commands: &mut Vec<PollerCommand>) {
        if coordinate == self.coordinate {
            return;
        }
        self.coordinate = coordinate;

        if let Some(feed) = self.feed.clone() {
            let fetched_at = self.snapshot.fetched_at;
            self.publish_if_changed(feed, fetched_at, commands);
        }

        if self.state == PollerState::Polling {
            self.start_polling(commands);
        }
    }

    fn on_fetch_completed(
        &mut self,
        request: RequestId,
        outcome: Result<TrainFeedResponse>,
        completed_at: DateTime<Utc>,
        commands: &mut Vec<PollerCommand>,
    ) {
        if self.ordering == FetchOrdering::LatestRequestOnly
            && self.latest_request != Some(request)
        {
            debug!("discarding result of superseded request {request}");
            self.stats.stale_results_discarded += 1;
            return;
        }

        match outcome {
            Ok(response) => {
                self.stats.fetches_succeeded += 1;
                let feed = response.flatten();
                self.feed = Some(feed.clone());
                self.publish_if_changed(feed, Some(completed_at), commands);
            }
            Err(e) => {
                self.stats.fetches_failed += 1;
                error!("train fetch {request} failed: {e}");
            }
        }
    }

    fn start_polling(&mut self, commands: &mut Vec<PollerCommand>) {
        self.state = PollerState::Polling;
        self.issue_fetch(commands);
        self.cancel_timer(commands);
        commands.push(PollerCommand::ArmTimer(self.interval));
        self.timer_armed = true;
    }

    fn cancel_timer(&mut self, commands: &mut Vec<PollerCommand>) {
        if self.timer_armed {
            commands.push(PollerCommand::CancelTimer);
            self.timer_armed = false;
        }
    }

    fn issue_fetch(&mut self, commands: &mut Vec<PollerCommand>) {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.latest_request = Some(request);
        self.stats.fetches_issued += 1;
        commands.push(PollerCommand::Fetch(request));
    }

    fn publish_if_changed(
        &mut self,
        feed: Vec<Train>,
        fetched_at: Option<DateTime<Utc>>,
        commands: &mut Vec<PollerCommand>,
    ) {
        let trains = arrange(feed, self.coordinate, self.unit);
        let sorted = self.coordinate.is_some();

        if *self.snapshot.trains == *trains && self.snapshot.sorted == sorted {
            debug!("train positions unchanged; skipping publish");
            return;
        }

        self.snapshot = TrainSnapshot {
            trains: Arc::from(trains),
            sorted,
            fetched_at,
            generation: self.snapshot.generation + 1,
        };
        self.stats.snapshots_published += 1;
        commands.push(PollerCommand::Publish(self.snapshot.clone()));
    }
}
