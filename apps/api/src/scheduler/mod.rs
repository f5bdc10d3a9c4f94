//! Scheduler: per-persona recurring triggers, each running one
//! select → comment cycle with failures logged and contained.

pub mod triggers;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::commentary::{CommentError, CommentResult, Commenter};
use crate::personas::PersonaStore;
use crate::selection::StrategySelector;

pub use triggers::{TokioTriggers, TriggerHost};

/// Terminal state of one cycle, as logged by [`Scheduler::on_trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Commented { comment_id: i64, content_id: i64 },
    NoEligibleContent,
    Blocked(String),
    Failed { code: &'static str, message: String },
}

pub struct Scheduler {
    personas: PersonaStore,
    triggers: Arc<dyn TriggerHost>,
    selector: StrategySelector,
    commenter: Commenter,
}

impl Scheduler {
    pub fn new(
        personas: PersonaStore,
        triggers: Arc<dyn TriggerHost>,
        selector: StrategySelector,
        commenter: Commenter,
    ) -> Self {
        Self {
            personas,
            triggers,
            selector,
            commenter,
        }
    }

    /// Clears any trigger for `persona_id`, then installs one if the persona has cron enabled.
    pub async fn reschedule(&self, persona_id: &str) -> anyhow::Result<()> {
        self.triggers.clear(persona_id);

        match self.personas.get(persona_id).await? {
            Some(persona) if persona.cron_enabled => {
                self.triggers.schedule(&persona.id, persona.cron_frequency);
                info!(
                    "Scheduled persona {} ({})",
                    persona.id, persona.cron_frequency
                );
            }
            _ => info!("Persona {persona_id} has no schedule"),
        }
        Ok(())
    }

    /// Installs triggers for every enabled persona. Returns how many were installed.
    pub async fn reschedule_all(&self) -> anyhow::Result<usize> {
        let mut installed = 0;
        for persona in self.personas.list().await? {
            self.triggers.clear(&persona.id);
            if persona.cron_enabled {
                self.triggers.schedule(&persona.id, persona.cron_frequency);
                installed += 1;
            }
        }
        info!("Installed {installed} persona schedule(s)");
        Ok(installed)
    }

    /// Clears one persona's trigger, or with `None` every known persona's
    /// trigger plus any orphan left by a persona removed out of band.
    pub async fn unschedule(&self, persona_id: Option<&str>) -> anyhow::Result<()> {
        match persona_id {
            Some(id) => {
                self.triggers.clear(id);
                info!("Unscheduled persona {id}");
            }
            None => {
                for persona in self.personas.list().await? {
                    self.triggers.clear(&persona.id);
                }
                for orphan in self.triggers.keys() {
                    warn!("Clearing orphaned trigger {orphan}");
                    self.triggers.clear(&orphan);
                }
                info!("Unscheduled all personas");
            }
        }
        Ok(())
    }

    /// One selector → commenter cycle. `Ok(None)` means nothing was eligible.
    pub async fn run_cycle(&self, persona_id: &str) -> Result<Option<CommentResult>, CommentError> {
        let persona = self
            .personas
            .get(persona_id)
            .await
            .map_err(|e| CommentError::Host(e.to_string()))?
            .ok_or_else(|| CommentError::PersonaNotFound(persona_id.to_string()))?;

        let Some(selection) = self
            .selector
            .select(&persona, None)
            .await
            .map_err(|e| CommentError::Host(e.to_string()))?
        else {
            return Ok(None);
        };

        self.commenter
            .comment(selection.content_id, &persona.id, 0, Some(selection.context))
            .await
            .map(Some)
    }

    /// Trigger entry point. Never propagates a failure; the outcome is logged and returned.
    pub async fn on_trigger(&self, persona_id: &str) -> CycleOutcome {
        let outcome = match self.run_cycle(persona_id).await {
            Ok(Some(result)) => CycleOutcome::Commented {
                comment_id: result.comment_id,
                content_id: result.target_content_id,
            },
            Ok(None) => CycleOutcome::NoEligibleContent,
            Err(CommentError::CommentBlocked(reason)) => CycleOutcome::Blocked(reason),
            Err(e) => CycleOutcome::Failed {
                code: e.code(),
                message: e.to_string(),
            },
        };

        match &outcome {
            CycleOutcome::Commented {
                comment_id,
                content_id,
            } => info!(
                "Persona {persona_id} commented on post {content_id} (comment {comment_id})"
            ),
            CycleOutcome::NoEligibleContent => {
                info!("Persona {persona_id}: no eligible content this cycle")
            }
            CycleOutcome::Blocked(reason) => {
                info!("Persona {persona_id}: comment blocked: {reason}")
            }
            CycleOutcome::Failed { code, message } => {
                error!("Persona {persona_id} cycle failed [{code}]: {message}")
            }
        }
        outcome
    }
}

/// Drains fired trigger keys, running each cycle on its own task so one
/// persona's failure or panic cannot hold up another's.
pub async fn run_dispatch(scheduler: Arc<Scheduler>, mut fired: UnboundedReceiver<String>) {
    while let Some(persona_id) = fired.recv().await {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            scheduler.on_trigger(&persona_id).await;
        });
    }
    warn!("Trigger channel closed, dispatch loop exiting");
}
