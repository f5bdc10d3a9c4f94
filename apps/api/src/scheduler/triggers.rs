use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::warn;

use crate::models::CronFrequency;

/// Recurring-trigger facility keyed by persona id.
///
/// At most one trigger exists per key; scheduling an existing key replaces it.
pub trait TriggerHost: Send + Sync {
    fn schedule(&self, key: &str, frequency: CronFrequency);
    fn clear(&self, key: &str);
    /// Keys with an installed trigger, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// One tokio interval task per key. Each tick sends the key to the dispatch channel.
pub struct TokioTriggers {
    sender: UnboundedSender<String>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioTriggers {
    /// Returns the facility and the receiving end the dispatch loop drains.
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = unbounded_channel();
        let triggers = Self {
            sender,
            tasks: Mutex::new(HashMap::new()),
        };
        (triggers, receiver)
    }

    fn tasks(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        // A poisoned map is still a valid map of handles.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TriggerHost for TokioTriggers {
    fn schedule(&self, key: &str, frequency: CronFrequency) {
        let period = frequency.period();
        let sender = self.sender.clone();
        let id = key.to_string();

        let handle = tokio::spawn(async move {
            // First fire is one full period out, like a freshly registered cron event.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if sender.send(id.clone()).is_err() {
                    warn!("Trigger channel closed, stopping schedule for {id}");
                    break;
                }
            }
        });

        if let Some(previous) = self.tasks().insert(key.to_string(), handle) {
            previous.abort();
        }
    }

    fn clear(&self, key: &str) {
        if let Some(handle) = self.tasks().remove(key) {
            handle.abort();
        }
    }

    fn keys(&self) -> Vec<String> {
        self.tasks().keys().cloned().collect()
    }
}
