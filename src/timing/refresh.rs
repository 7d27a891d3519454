use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tokio::{
    sync::watch,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    directory::{business::Business, store::Directory},
    error::AppError,
    ISO_FORMAT,
};

use super::{
    clock::Clock,
    evaluator::{EvaluationInstant, OpenState},
};

pub const STANDARD_REFRESH_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessStatus {
    pub business: Business,
    pub state: OpenState,
}

impl BusinessStatus {
    pub fn evaluate(business: Business, now: &DateTime<Tz>) -> Self {
        let state = OpenState::evaluate(&business.hours, EvaluationInstant::from_datetime(now));
        Self { business, state }
    }
}

/// The result of one refresh. `generation` is 0 until the first refresh lands.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub generation: u64,
    pub computed_at: Option<String>,
    pub statuses: Vec<BusinessStatus>,
}

/// Re-evaluates every business from scratch, once straight away and then once per
/// period, and publishes each result for readers of the watch channel.
pub struct StatusRefresher {
    directory: Directory,
    clock: Arc<dyn Clock>,
    period: Duration,
    sender: watch::Sender<Arc<StatusSnapshot>>,
}

impl StatusRefresher {
    pub fn new(
        directory: Directory,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> (Self, watch::Receiver<Arc<StatusSnapshot>>) {
        let (sender, receiver) = watch::channel(Arc::new(StatusSnapshot::default()));
        let refresher = Self {
            directory,
            clock,
            period,
            sender,
        };
        (refresher, receiver)
    }

    /// One full recomputation. Nothing from the previous snapshot is reused
    /// except its generation number.
    pub fn refresh(&self) -> Result<Arc<StatusSnapshot>, AppError> {
        let now = self.clock.now();
        let statuses: Vec<BusinessStatus> = self
            .directory
            .businesses()?
            .into_iter()
            .map(|business| BusinessStatus::evaluate(business, &now))
            .collect();

        let snapshot = Arc::new(StatusSnapshot {
            generation: self.sender.borrow().generation + 1,
            computed_at: Some(now.format(ISO_FORMAT).to_string()),
            statuses,
        });
        self.sender.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "Status refresher started");
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => match self.refresh() {
                    Ok(snapshot) => debug!(
                        generation = snapshot.generation,
                        businesses = snapshot.statuses.len(),
                        "Statuses refreshed"
                    ),
                    Err(err) => warn!("Could not refresh statuses: {}", err),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Status refresher stopped");
    }
}
