use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{StepContext, StepExecutor, StepOutcome};
use crate::definition::StepDefinition;
use crate::error::Result;

/// Configuration of a `final_commit` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalCommitConfig {
    /// Status written to the case
    pub final_status: String,
}

/// Writes the final status and ends the execution
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalCommitExecutor;

#[async_trait]
impl StepExecutor for FinalCommitExecutor {
    async fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_>,
    ) -> Result<StepOutcome> {
        let config: FinalCommitConfig = step.config_as()?;
        let now = ctx.now();

        ctx.case
            .update(|case| case.set_status(config.final_status.clone(), now));
        info!(
            "Case {} committed with status '{}'",
            ctx.case_id, config.final_status
        );

        Ok(StepOutcome::Terminate)
    }

    fn validate(&self, step: &StepDefinition) -> Result<()> {
        step.config_as::<FinalCommitConfig>().map(|_| ())
    }
}
