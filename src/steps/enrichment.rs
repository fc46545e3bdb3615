use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{StepContext, StepExecutor, StepOutcome};
use crate::case::CaseData;
use crate::definition::StepDefinition;
use crate::engine::resolver::resolve_transition;
use crate::error::{Error, Result};
use crate::journal::JournalEntry;

/// Activity kind written after enrichment
pub const AI_ANALYSIS: &str = "ai_analysis";

/// Fields an enricher contributes to `caseData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Summary of the case
    pub ai_summary: String,
    /// Policy check outcome
    pub ai_policy_check: String,
    /// Risk score label
    pub ai_risk_score: String,
}

/// External collaborator producing AI insights for a case
#[async_trait]
pub trait CaseEnricher: Send + Sync + std::fmt::Debug {
    /// Analyse the case's business data
    async fn enrich(&self, case_data: &CaseData) -> Result<Enrichment>;
}

/// Enricher that always returns the same insights
#[derive(Debug, Clone)]
pub struct StaticEnricher {
    enrichment: Enrichment,
}

impl StaticEnricher {
    /// Create an enricher returning `enrichment`
    pub fn new(enrichment: Enrichment) -> Self {
        Self { enrichment }
    }
}

#[async_trait]
impl CaseEnricher for StaticEnricher {
    async fn enrich(&self, _case_data: &CaseData) -> Result<Enrichment> {
        Ok(self.enrichment.clone())
    }
}

/// Calls the enricher, merges its output into the case and follows the
/// default transition.
#[derive(Debug, Clone, Default)]
pub struct CaseEnrichmentExecutor {
    enricher: Option<Arc<dyn CaseEnricher>>,
}

impl CaseEnrichmentExecutor {
    /// Executor backed by `enricher`
    pub fn new(enricher: Arc<dyn CaseEnricher>) -> Self {
        Self {
            enricher: Some(enricher),
        }
    }

    async fn enrichment(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_>,
    ) -> Result<Option<Enrichment>> {
        if let Some((output, at)) = ctx.log.replay_activity(&step.step_id).await? {
            ctx.advance_clock(at);
            // A null output marks a step that ran without an enricher
            if output.is_null() {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_value(output)?));
        }

        let enricher = match &self.enricher {
            Some(enricher) => enricher,
            None => {
                warn!(
                    "No enricher configured, step {} leaves case data pending",
                    step.step_id
                );
                ctx.log
                    .record(JournalEntry::ActivityCompleted {
                        step_id: step.step_id.clone(),
                        output: Value::Null,
                        at: ctx.now(),
                    })
                    .await?;
                return Ok(None);
            }
        };

        let case_data = ctx
            .case
            .snapshot()
            .map(|case| case.case_details.case_data)
            .ok_or_else(|| Error::Enrichment("case is not initialised".to_string()))?;

        let enrichment = enricher.enrich(&case_data).await?;
        let at = Utc::now();
        ctx.log
            .record(JournalEntry::ActivityCompleted {
                step_id: step.step_id.clone(),
                output: serde_json::to_value(&enrichment)?,
                at,
            })
            .await?;
        ctx.advance_clock(at);
        Ok(Some(enrichment))
    }
}

#[async_trait]
impl StepExecutor for CaseEnrichmentExecutor {
    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_>,
    ) -> Result<StepOutcome> {
        if let Some(enrichment) = self.enrichment(step, ctx).await? {
            let now = ctx.now();
            info!(
                "Case {} enriched, risk score {}",
                ctx.case_id, enrichment.ai_risk_score
            );
            ctx.case.update(|case| {
                let text = format!("Analysis complete. Risk Score: {}.", enrichment.ai_risk_score);
                let data = &mut case.case_details.case_data;
                data.ai_summary = enrichment.ai_summary;
                data.ai_policy_check = enrichment.ai_policy_check;
                data.ai_risk_score = enrichment.ai_risk_score;
                case.append_activity(AI_ANALYSIS, "AI Agent", text, now);
            });
        }

        let next = resolve_transition(&step.step_id, &step.transitions, None)?;
        Ok(StepOutcome::Next(next.to_string()))
    }
}
