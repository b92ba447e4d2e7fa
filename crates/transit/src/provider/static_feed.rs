//! In-memory train feed.
//!
//! Serves a scripted sequence of responses without touching the network.
//! Once the script runs out the last successful response is served again,
//! which is what a quiet real feed looks like between position updates.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{Result, TrainFeedResponse, TransitError};
use crate::network::TrainFeed;

#[derive(Clone, Debug)]
pub enum FeedStep {
    Respond(TrainFeedResponse),
    Fail(TransitError),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<FeedStep>,
    last_response: TrainFeedResponse,
}

#[derive(Default)]
pub struct StaticTrainFeed {
    script: Mutex<Script>,
    requests: AtomicUsize,
}

impl StaticTrainFeed {
    /// A feed that always answers with `response`
    pub fn from_response(response: TrainFeedResponse) -> Self {
        Self {
            script: Mutex::new(Script {
                steps: VecDeque::new(),
                last_response: response,
            }),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn from_steps(steps: impl IntoIterator<Item = FeedStep>) -> Self {
        Self {
            script: Mutex::new(Script {
                steps: steps.into_iter().collect(),
                last_response: TrainFeedResponse::default(),
            }),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, step: FeedStep) {
        if let Ok(mut script) = self.script.lock() {
            script.steps.push_back(step);
        }
    }

    /// Number of fetches served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<TrainFeedResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let mut script = self
            .script
            .lock()
            .map_err(|_| TransitError::InvalidData("feed script poisoned".into()))?;

        match script.steps.pop_front() {
            Some(FeedStep::Respond(response)) => {
                script.last_response = response.clone();
                Ok(response)
            }
            Some(FeedStep::Fail(error)) => Err(error),
            None => Ok(script.last_response.clone()),
        }
    }
}

impl TrainFeed for StaticTrainFeed {
    fn fetch_all_trains<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<TrainFeedResponse>> + Send + 'a>> {
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}
