//! Human input handling for cases.
//!
//! A handler turns a published interaction into a decision; [`attend`] keeps
//! answering a case's interactions until its execution finishes.

mod handler;
mod types;

use tracing::info;

use crate::engine::{CaseExecution, ExecutionStatus};
use crate::error::Result;

pub use handler::{ConsoleInputHandler, ScriptedInputHandler};
pub use types::{HumanInputHandler, HumanInputRequest, HumanInputResponse};

/// Answer every interaction `execution` publishes with `handler`.
///
/// Returns the final status once the execution stops making progress.
pub async fn attend(
    execution: &CaseExecution,
    handler: &dyn HumanInputHandler,
) -> Result<ExecutionStatus> {
    let mut answered = 0usize;

    loop {
        let pending = execution
            .wait_for_state(|case| {
                case.active_interaction.is_some() && case.activity_stream.len() > answered
            })
            .await;

        let case = match pending {
            Some(case) => case,
            None => return Ok(execution.wait_until_finished().await),
        };
        let interaction = match &case.active_interaction {
            Some(interaction) => interaction,
            None => continue,
        };

        let request = HumanInputRequest::from_interaction(case.case_id(), interaction);
        let response = handler.handle_request(request).await?;
        info!(
            "Submitting decision '{}' for {}",
            response.response, response.request_id
        );
        execution.decision(response.response).await?;
        answered = case.activity_stream.len();
    }
}
