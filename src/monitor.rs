//! Periodic polling task that owns the trend window.
//!
//! The window lives inside the task; readers only see published snapshots.
//! Dropping the [`Monitor`] aborts the task, so no tick can touch the window
//! after its view is gone. Ticks already applied stay applied.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::sensor::{EnvironmentalReading, ReadingSource};
use crate::status::StatusCard;
use crate::trend::{TrendSample, TrendWindow};

/// `tokio::time::interval` panics on a zero period.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, Serialize)]
pub struct TrendSnapshot {
    pub samples: Vec<TrendSample>,
    pub status: StatusCard,
    pub environment: Option<EnvironmentalReading>,
}

impl TrendSnapshot {
    fn empty() -> Self {
        Self {
            samples: Vec::new(),
            status: StatusCard::unknown(),
            environment: None,
        }
    }
}

pub struct Monitor {
    rx: watch::Receiver<Arc<TrendSnapshot>>,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Start polling `source` every `period`, first tick immediately.
    /// Periods below [`MIN_PERIOD`] are raised to it.
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(mut source: S, period: Duration, capacity: usize) -> Self
    where
        S: ReadingSource + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (tx, rx) = watch::channel(Arc::new(TrendSnapshot::empty()));
        let task = tokio::spawn(async move {
            let mut window = TrendWindow::with_capacity(capacity);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let at = Utc::now();
                let reading = source.next_reading(at);
                window.append(reading.risk_reading(at));
                debug!(
                    probability = reading.probability(),
                    len = window.len(),
                    "trend sample appended"
                );
                let snapshot = TrendSnapshot {
                    samples: window.to_vec(),
                    status: StatusCard::from_reading(reading.probability(), at),
                    environment: Some(reading),
                };
                if tx.send(Arc::new(snapshot)).is_err() {
                    break;
                }
            }
        });
        info!(period_ms = period.as_millis() as u64, capacity, "trend monitor started");
        Self { rx, task }
    }

    pub fn snapshot(&self) -> Arc<TrendSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TrendSnapshot>> {
        self.rx.clone()
    }

    /// Cancel future ticks.
    pub fn shutdown(&self) {
        if !self.task.is_finished() {
            info!("trend monitor stopped");
        }
        self.task.abort();
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
