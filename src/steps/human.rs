use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::{StepContext, StepExecutor, StepOutcome};
use crate::case::{activity, ActionButton, ActiveInteraction, InteractionPayload};
use crate::definition::StepDefinition;
use crate::engine::resolver::resolve_transition;
use crate::error::Result;
use crate::journal::JournalEntry;
use crate::signal::{Signal, DECISION_SIGNAL, TIMEOUT_SIGNAL_VALUE};
use crate::telemetry::add_metric;

/// Sender recorded on decision activities
pub const DECISION_SENDER: &str = "Agent";

/// Configuration of a `human_in_the_loop` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanInTheLoopConfig {
    /// Prompt shown to the reviewer
    pub prompt: String,

    /// Buttons offered, in order
    #[serde(default)]
    pub actions: Vec<ActionButton>,

    /// Widget kind
    #[serde(default = "default_interaction_type")]
    pub interaction_type: String,

    /// Overrides the engine's signal timeout for this step
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_interaction_type() -> String {
    "action_buttons".to_string()
}

/// Publishes an interaction, suspends until a decision arrives, then follows
/// the transition matching the decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanInTheLoopExecutor;

impl HumanInTheLoopExecutor {
    fn interaction(
        step: &StepDefinition,
        config: &HumanInTheLoopConfig,
        ctx: &StepContext<'_>,
    ) -> ActiveInteraction {
        ActiveInteraction {
            interaction_id: format!("{}_{}", step.step_id, ctx.case_id),
            interaction_type: config.interaction_type.clone(),
            prompt: config.prompt.clone(),
            payload: InteractionPayload {
                actions: config.actions.clone(),
            },
            submit_url: format!(
                "{}/{}/decision",
                ctx.settings.submit_url_base.trim_end_matches('/'),
                ctx.case_id
            ),
        }
    }

    async fn await_decision(
        step: &StepDefinition,
        config: &HumanInTheLoopConfig,
        ctx: &StepContext<'_>,
    ) -> Result<Signal> {
        if let Some(signal) = ctx.log.replay_signal(&step.step_id).await? {
            info!("Replayed decision '{}' for step {}", signal.value, step.step_id);
            return Ok(signal);
        }

        let timeout = config
            .timeout_seconds
            .or(ctx.settings.signal_timeout_seconds)
            .map(Duration::from_secs);

        info!("Case {} waiting for decision at step {}", ctx.case_id, step.step_id);
        let signal = match ctx.inbox.wait(timeout).await {
            Some(signal) => signal,
            None => {
                warn!(
                    "No decision for step {} within {:?}, resolving as '{}'",
                    step.step_id, timeout, TIMEOUT_SIGNAL_VALUE
                );
                Signal::new(DECISION_SIGNAL, TIMEOUT_SIGNAL_VALUE)
            }
        };

        ctx.log
            .record(JournalEntry::SignalConsumed {
                step_id: step.step_id.clone(),
                signal: signal.clone(),
            })
            .await?;
        add_metric(
            "case_decisions_total",
            1.0,
            &[("step", step.step_id.clone()), ("value", signal.value.clone())],
        );
        Ok(signal)
    }
}

#[async_trait]
impl StepExecutor for HumanInTheLoopExecutor {
    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_>,
    ) -> Result<StepOutcome> {
        let config: HumanInTheLoopConfig = step.config_as()?;

        ctx.inbox.clear().await;

        let interaction = Self::interaction(step, &config, ctx);
        let review_status = ctx.settings.review_status.clone();
        let now = ctx.now();
        ctx.case
            .update(|case| case.begin_interaction(interaction, review_status, now));

        let signal = Self::await_decision(step, &config, ctx).await?;
        ctx.advance_clock(signal.received_at);
        let now = ctx.now();

        info!("Decision '{}' received at step {}", signal.value, step.step_id);
        ctx.case.update(|case| {
            case.append_activity(
                activity::AGENT_DECISION,
                DECISION_SENDER,
                format!("Case marked as '{}'.", signal.value),
                now,
            );
            case.clear_interaction(now);
        });

        let next = resolve_transition(&step.step_id, &step.transitions, Some(&signal.value))?;
        Ok(StepOutcome::Next(next.to_string()))
    }

    fn validate(&self, step: &StepDefinition) -> Result<()> {
        step.config_as::<HumanInTheLoopConfig>().map(|_| ())
    }
}
