use async_trait::async_trait;
use caseflow::case::{activity, CaseData, PENDING_RISK_SCORE};
use caseflow::config::EngineSettings;
use caseflow::definition::{
    DefinitionLoader, InMemoryDefinitionLoader, ProcessDefinition, StepDefinition,
    YamlDirectoryLoader,
};
use caseflow::journal::{ExecutionJournal, InMemoryJournal, JournalEntry};
use caseflow::steps::{CaseEnricher, Enrichment, StaticEnricher};
use caseflow::{
    Case, Error, ExecutionStatus, ProcessEngine, Result, Signal, SignalDisposition, StepType,
    Transition,
};
use chrono::Utc;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_test::assert_ok;

fn review_step(id: &str) -> StepDefinition {
    StepDefinition::new(id, StepType::human_in_the_loop())
        .with_config("prompt", "Please review the expense report.")
        .with_config(
            "actions",
            json!([
                { "label": "Approve", "value": "approved", "style": "primary" },
                { "label": "Reject", "value": "rejected", "style": "danger" }
            ]),
        )
}

fn commit_step(id: &str, status: &str) -> StepDefinition {
    StepDefinition::new(id, StepType::final_commit()).with_config("final_status", status)
}

fn approval_definition() -> ProcessDefinition {
    ProcessDefinition::new("expense_approval", "1.0.0", "review")
        .with_step(
            review_step("review")
                .with_transition(Transition::on("approved", "end_ok"))
                .with_transition(Transition::on("rejected", "end_bad")),
        )
        .with_step(commit_step("end_ok", "Approved"))
        .with_step(commit_step("end_bad", "Rejected"))
}

fn engine_with(definition: ProcessDefinition, settings: EngineSettings) -> ProcessEngine {
    let loader = Arc::new(InMemoryDefinitionLoader::new().with_definition(definition));
    ProcessEngine::new(loader, settings)
}

fn payload() -> Value {
    json!({
        "submitter_name": "Jane Doe",
        "submitter_email": "jane@example.com",
        "amount": 750.0,
        "category": "Travel"
    })
}

fn decisions(case: &Case) -> Vec<&str> {
    case.activity_stream
        .iter()
        .filter(|item| item.kind == activity::AGENT_DECISION)
        .map(|item| item.text.as_str())
        .collect()
}

#[tokio::test]
async fn test_approval_path() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-a", "expense_approval", "1.0.0", payload());

    let interaction = execution.wait_for_interaction().await.unwrap();
    assert_eq!(interaction.interaction_id, "review_case-a");
    assert_eq!(interaction.interaction_type, "action_buttons");
    assert_eq!(interaction.submit_url, "/api/v1/cases/case-a/decision");
    assert_eq!(interaction.payload.actions.len(), 2);

    let suspended = execution.get_current_state().unwrap();
    assert_eq!(suspended.status(), "Pending Human Review");
    assert_eq!(suspended.case_details.case_title, "Expense from Jane Doe");
    assert_eq!(suspended.case_details.assignee.name, "AI Triage");
    assert_eq!(suspended.activity_stream.len(), 1);
    assert_eq!(suspended.activity_stream[0].text, "Case created by Jane Doe.");
    assert_eq!(execution.status(), ExecutionStatus::Running);

    assert_eq!(
        execution.decision("approved").await.unwrap(),
        SignalDisposition::Accepted
    );
    let case = execution.result().await.unwrap();

    assert_eq!(case.status(), "Approved");
    assert!(case.active_interaction.is_none());
    assert_eq!(decisions(&case), vec!["Case marked as 'approved'."]);
    let ids: Vec<u64> = case.activity_stream.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(case.activity_stream[1].sender, "Agent");
}

#[tokio::test]
async fn test_default_listed_first_does_not_shadow_match() {
    let definition = ProcessDefinition::new("expense_approval", "1.0.0", "review")
        .with_step(
            review_step("review")
                .with_transition(Transition::default_to("end_other"))
                .with_transition(Transition::on("rejected", "end_bad")),
        )
        .with_step(commit_step("end_bad", "Rejected"))
        .with_step(commit_step("end_other", "Needs Follow-up"));
    let engine = engine_with(definition, EngineSettings::default());

    let execution = engine.start("case-b", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("rejected").await);
    assert_eq!(execution.result().await.unwrap().status(), "Rejected");

    let execution = engine.start("case-b2", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("escalate").await);
    assert_eq!(execution.result().await.unwrap().status(), "Needs Follow-up");
}

fn dangling_definition() -> ProcessDefinition {
    ProcessDefinition::new("expense_approval", "1.0.0", "review")
        .with_step(review_step("review").with_transition(Transition::on("approved", "ghost")))
}

#[tokio::test]
async fn test_dangling_transition_rejected_before_start() {
    let engine = engine_with(dangling_definition(), EngineSettings::default());
    let execution = engine.start("case-c", "expense_approval", "1.0.0", payload());

    assert!(matches!(
        execution.wait_until_finished().await,
        ExecutionStatus::Failed(_)
    ));
    assert!(execution.get_current_state().is_none());
    match execution.result().await {
        Err(Error::DanglingTransition { step_id, next_step }) => {
            assert_eq!(step_id, "review");
            assert_eq!(next_step, "ghost");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_dangling_transition_fails_when_taken() {
    let settings = EngineSettings {
        validate_on_load: false,
        ..EngineSettings::default()
    };
    let engine = engine_with(dangling_definition(), settings);
    let execution = engine.start("case-c2", "expense_approval", "1.0.0", payload());

    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("approved").await);

    let status = execution.wait_until_finished().await;
    assert!(matches!(status, ExecutionStatus::Failed(_)));
    let last = execution.get_current_state().unwrap();
    assert_eq!(decisions(&last), vec!["Case marked as 'approved'."]);

    match execution.result().await {
        Err(err @ Error::StepNotFound { .. }) => {
            assert!(err.is_definition_error());
            assert_eq!(err.step_id(), Some("ghost"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unmapped_signal_is_definition_error() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-d", "expense_approval", "1.0.0", payload());

    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("maybe").await);

    match execution.result().await {
        Err(Error::NoMatchingTransition { step_id, signal }) => {
            assert_eq!(step_id, "review");
            assert_eq!(signal.as_deref(), Some("maybe"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_step_type() {
    let definition = ProcessDefinition::new("expense_approval", "1.0.0", "wait")
        .with_step(StepDefinition::new("wait", "timer").with_transition(Transition::default_to("end")))
        .with_step(commit_step("end", "Done"));
    let engine = engine_with(definition, EngineSettings::default());

    match engine.run("case-e", "expense_approval", "1.0.0", Value::Null).await {
        Err(Error::UnknownStepType { step_id, step_type }) => {
            assert_eq!(step_id, "wait");
            assert_eq!(step_type, "timer");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_definition() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let result = engine.run("case-f", "expense_approval", "9.9.9", payload()).await;
    assert!(matches!(result, Err(Error::DefinitionNotFound { .. })));
}

#[tokio::test]
async fn test_null_payload_uses_defaults() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-g", "expense_approval", "1.0.0", Value::Null);

    execution.wait_for_interaction().await.unwrap();
    let case = execution.get_current_state().unwrap();
    assert_eq!(case.case_details.submitter.name, "N/A");
    assert_eq!(case.case_details.case_data.amount, 0.0);
    assert_eq!(case.case_details.case_data.currency, "USD");
    assert_eq!(case.case_details.case_data.category, "Uncategorized");
    assert_eq!(case.case_details.case_data.ai_risk_score, PENDING_RISK_SCORE);
    execution.cancel();
}

#[derive(Debug)]
struct GatedLoader {
    gate: Arc<Notify>,
    inner: InMemoryDefinitionLoader,
}

#[async_trait]
impl DefinitionLoader for GatedLoader {
    async fn load_definition(&self, name: &str, version: &str) -> Result<ProcessDefinition> {
        self.gate.notified().await;
        self.inner.load_definition(name, version).await
    }
}

#[tokio::test]
async fn test_query_before_start_is_none() {
    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        gate: Arc::clone(&gate),
        inner: InMemoryDefinitionLoader::new().with_definition(approval_definition()),
    });
    let engine = ProcessEngine::new(loader, EngineSettings::default());
    let execution = engine.start("case-h", "expense_approval", "1.0.0", payload());

    assert!(execution.get_current_state().is_none());
    assert_eq!(execution.status(), ExecutionStatus::Running);

    gate.notify_one();
    let interaction = execution.wait_for_interaction().await;
    assert!(interaction.is_some());
    execution.cancel();
}

#[tokio::test]
async fn test_first_signal_wins() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-i", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();

    assert_eq!(
        execution.decision("rejected").await.unwrap(),
        SignalDisposition::Accepted
    );
    // The second value is either dropped or arrives after the wait ended
    let _ = execution.decision("approved").await;

    let case = execution.result().await.unwrap();
    assert_eq!(case.status(), "Rejected");
    assert_eq!(decisions(&case), vec!["Case marked as 'rejected'."]);
}

#[tokio::test]
async fn test_stale_signal_is_cleared_at_step_entry() {
    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        gate: Arc::clone(&gate),
        inner: InMemoryDefinitionLoader::new().with_definition(approval_definition()),
    });
    let engine = ProcessEngine::new(loader, EngineSettings::default());
    let execution = engine.start("case-j", "expense_approval", "1.0.0", payload());

    // Delivered before the review step starts waiting
    assert_eq!(
        execution.decision("approved").await.unwrap(),
        SignalDisposition::Accepted
    );
    gate.notify_one();

    execution.wait_for_interaction().await.unwrap();
    assert_eq!(execution.status(), ExecutionStatus::Running);
    assert_ok!(execution.decision("rejected").await);
    assert_eq!(execution.result().await.unwrap().status(), "Rejected");
}

#[tokio::test]
async fn test_cancel_keeps_last_state() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-k", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();

    execution.cancel();
    assert_eq!(execution.status(), ExecutionStatus::Cancelled);
    assert!(execution.get_current_state().unwrap().active_interaction.is_some());
    assert!(matches!(
        execution.decision("approved").await,
        Err(Error::NotRunning(_))
    ));
    assert!(matches!(execution.result().await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_cancel_after_completion_keeps_status() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-k2", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("approved").await);
    assert_eq!(execution.wait_until_finished().await, ExecutionStatus::Completed);

    execution.cancel();
    assert_eq!(execution.status(), ExecutionStatus::Completed);
    assert_eq!(execution.result().await.unwrap().status(), "Approved");
}

#[tokio::test(start_paused = true)]
async fn test_signal_timeout_resolves_as_timeout() {
    let definition = ProcessDefinition::new("expense_approval", "1.0.0", "review")
        .with_step(
            review_step("review")
                .with_config("timeout_seconds", 3600)
                .with_transition(Transition::on("approved", "end_ok"))
                .with_transition(Transition::on("timeout", "escalated")),
        )
        .with_step(commit_step("end_ok", "Approved"))
        .with_step(commit_step("escalated", "Escalated"));
    let engine = engine_with(definition, EngineSettings::default());

    let case = engine
        .run("case-l", "expense_approval", "1.0.0", payload())
        .await
        .unwrap();
    assert_eq!(case.status(), "Escalated");
    assert_eq!(decisions(&case), vec!["Case marked as 'timeout'."]);
}

#[tokio::test]
async fn test_step_limit_stops_cycles() {
    let definition = ProcessDefinition::new("loop", "1", "a")
        .with_step(
            StepDefinition::new("a", StepType::case_enrichment())
                .with_transition(Transition::default_to("b")),
        )
        .with_step(
            StepDefinition::new("b", StepType::case_enrichment())
                .with_transition(Transition::default_to("a")),
        );
    let settings = EngineSettings {
        max_steps: 10,
        ..EngineSettings::default()
    };
    let engine = engine_with(definition, settings);

    let result = engine.run("case-m", "loop", "1", Value::Null).await;
    assert!(matches!(result, Err(Error::StepLimitExceeded { limit: 10 })));
}

#[derive(Debug, Default)]
struct CountingEnricher {
    calls: AtomicUsize,
}

#[async_trait]
impl CaseEnricher for CountingEnricher {
    async fn enrich(&self, case_data: &CaseData) -> Result<Enrichment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let risk = if case_data.amount > 500.0 { "Medium" } else { "Low" };
        Ok(Enrichment {
            ai_summary: format!("{} expense", case_data.category),
            ai_policy_check: "Within policy".to_string(),
            ai_risk_score: risk.to_string(),
        })
    }
}

fn enriched_definition() -> ProcessDefinition {
    ProcessDefinition::new("expense_approval", "2.0.0", "triage")
        .with_step(
            StepDefinition::new("triage", StepType::case_enrichment())
                .with_transition(Transition::default_to("review")),
        )
        .with_step(
            review_step("review")
                .with_transition(Transition::on("approved", "end_ok"))
                .with_transition(Transition::on("rejected", "end_bad")),
        )
        .with_step(commit_step("end_ok", "Approved"))
        .with_step(commit_step("end_bad", "Rejected"))
}

#[tokio::test]
async fn test_enrichment_merges_case_data() {
    let engine = engine_with(enriched_definition(), EngineSettings::default()).with_enricher(
        Arc::new(StaticEnricher::new(Enrichment {
            ai_summary: "Flight to the annual conference.".to_string(),
            ai_policy_check: "Exceeds the standard limit.".to_string(),
            ai_risk_score: "Medium".to_string(),
        })),
    );
    let execution = engine.start("case-n", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();

    let case = execution.get_current_state().unwrap();
    let data = &case.case_details.case_data;
    assert_eq!(data.ai_summary, "Flight to the annual conference.");
    assert_eq!(data.ai_risk_score, "Medium");
    assert_eq!(data.amount, 750.0);
    assert_eq!(case.activity_stream[1].kind, "ai_analysis");
    assert_eq!(case.activity_stream[1].sender, "AI Agent");
    assert_eq!(case.activity_stream[1].text, "Analysis complete. Risk Score: Medium.");
    execution.cancel();
}

#[tokio::test]
async fn test_enrichment_without_enricher_keeps_placeholders() {
    let engine = engine_with(enriched_definition(), EngineSettings::default());
    let execution = engine.start("case-o", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();

    let case = execution.get_current_state().unwrap();
    assert_eq!(case.case_details.case_data.ai_risk_score, PENDING_RISK_SCORE);
    assert_eq!(case.activity_stream.len(), 1);
    execution.cancel();
}

#[tokio::test]
async fn test_resume_after_crash_mid_suspension() {
    let journal = Arc::new(InMemoryJournal::new());
    let enricher = Arc::new(CountingEnricher::default());
    let engine = engine_with(enriched_definition(), EngineSettings::default())
        .with_journal(journal.clone())
        .with_enricher(enricher.clone());

    let execution = engine.start("case-p", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    let before_crash = execution.get_current_state().unwrap();
    execution.cancel();

    let resumed = engine.resume("case-p").await.unwrap();
    resumed.wait_for_interaction().await.unwrap();
    assert_eq!(resumed.get_current_state().unwrap(), before_crash);
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);

    assert_ok!(resumed.decision("approved").await);
    let case = resumed.result().await.unwrap();
    assert_eq!(case.status(), "Approved");
    assert_eq!(case.case_details.case_data.ai_risk_score, "Medium");

    let entries = journal.load("case-p").await.unwrap();
    let kinds: Vec<&str> = entries.iter().map(JournalEntry::kind).collect();
    assert_eq!(
        kinds,
        vec!["started", "activity_completed", "signal_consumed", "completed"]
    );
}

#[tokio::test]
async fn test_resume_without_enricher_mid_suspension() {
    let journal = Arc::new(InMemoryJournal::new());
    let engine = engine_with(enriched_definition(), EngineSettings::default())
        .with_journal(journal.clone());

    let execution = engine.start("case-pa", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    let before_crash = execution.get_current_state().unwrap();
    execution.cancel();

    let resumed = engine.resume("case-pa").await.unwrap();
    resumed.wait_for_interaction().await.unwrap();
    assert_eq!(resumed.get_current_state().unwrap(), before_crash);

    assert_ok!(resumed.decision("approved").await);
    let case = resumed.result().await.unwrap();
    assert_eq!(case.status(), "Approved");
    assert_eq!(case.case_details.case_data.ai_risk_score, PENDING_RISK_SCORE);

    let entries = journal.load("case-pa").await.unwrap();
    let kinds: Vec<&str> = entries.iter().map(JournalEntry::kind).collect();
    assert_eq!(
        kinds,
        vec!["started", "activity_completed", "signal_consumed", "completed"]
    );
}

#[tokio::test]
async fn test_resume_without_enricher_after_completion() {
    let journal = Arc::new(InMemoryJournal::new());
    let engine = engine_with(enriched_definition(), EngineSettings::default())
        .with_journal(journal.clone());

    let execution = engine.start("case-pb", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("approved").await);
    let original = execution.result().await.unwrap();

    let replayed = engine.resume("case-pb").await.unwrap().result().await.unwrap();
    assert_eq!(replayed, original);
    assert_eq!(replayed.status(), "Approved");
}

#[tokio::test]
async fn test_replay_reproduces_final_state() {
    let journal = Arc::new(InMemoryJournal::new());
    let enricher = Arc::new(CountingEnricher::default());
    let engine = engine_with(enriched_definition(), EngineSettings::default())
        .with_journal(journal.clone())
        .with_enricher(enricher.clone());

    let execution = engine.start("case-q", "expense_approval", "2.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("rejected").await);
    let original = execution.result().await.unwrap();
    let journaled = journal.load("case-q").await.unwrap().len();

    let replayed = engine.resume("case-q").await.unwrap().result().await.unwrap();
    assert_eq!(replayed, original);
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(journal.load("case-q").await.unwrap().len(), journaled);
}

#[tokio::test]
async fn test_replay_divergence() {
    let journal = Arc::new(InMemoryJournal::new());
    let now = Utc::now();
    journal
        .append(
            "case-r",
            &JournalEntry::Started {
                case_id: "case-r".to_string(),
                process_name: "expense_approval".to_string(),
                process_version: "1.0.0".to_string(),
                payload: payload(),
                at: now,
            },
        )
        .await
        .unwrap();
    journal
        .append(
            "case-r",
            &JournalEntry::SignalConsumed {
                step_id: "other_step".to_string(),
                signal: Signal::decision("approved"),
            },
        )
        .await
        .unwrap();

    let engine = engine_with(approval_definition(), EngineSettings::default())
        .with_journal(journal.clone());
    let result = engine.resume("case-r").await.unwrap().result().await;
    match result {
        Err(Error::ReplayDivergence { step_id, .. }) => assert_eq!(step_id, "review"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_resume_unknown_case() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    assert!(matches!(
        engine.resume("nobody").await,
        Err(Error::CaseNotFound(_))
    ));
}

#[tokio::test]
async fn test_case_json_shape() {
    let engine = engine_with(approval_definition(), EngineSettings::default());
    let execution = engine.start("case-s", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();

    let suspended = serde_json::to_value(execution.get_current_state().unwrap()).unwrap();
    assert_eq!(suspended["caseDetails"]["caseId"], "case-s");
    assert_eq!(suspended["caseDetails"]["caseData"]["currency"], "USD");
    assert_eq!(suspended["activityStream"][0]["type"], "system_event");
    assert_eq!(
        suspended["activeInteraction"]["submitUrl"],
        "/api/v1/cases/case-s/decision"
    );

    assert_ok!(execution.decision("approved").await);
    let case = execution.result().await.unwrap();
    let encoded = serde_json::to_value(&case).unwrap();
    assert!(encoded["activeInteraction"].is_null());
    let decoded: Case = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, case);
}

#[tokio::test]
async fn test_bundled_expense_definition() {
    let loader = YamlDirectoryLoader::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/process_definitions"
    ));
    let definition = loader
        .load_definition("expense_approval", "1.0.0")
        .await
        .unwrap();
    let engine = ProcessEngine::new(Arc::new(loader), EngineSettings::default());
    assert_ok!(engine.validate(&definition));

    let execution = engine.start("case-t", "expense_approval", "1.0.0", payload());
    execution.wait_for_interaction().await.unwrap();
    assert_ok!(execution.decision("rejected").await);
    let original = execution.result().await.unwrap();
    assert_eq!(original.status(), "Rejected");

    // No enricher is configured; the journal still rebuilds the case
    let replayed = engine.resume("case-t").await.unwrap().result().await.unwrap();
    assert_eq!(replayed, original);
}

fn review_chain(length: usize) -> ProcessDefinition {
    let mut definition = ProcessDefinition::new("chain", "1", "review_0");
    for i in 0..length {
        let next = if i + 1 == length {
            "end".to_string()
        } else {
            format!("review_{}", i + 1)
        };
        definition =
            definition.with_step(review_step(&format!("review_{}", i)).with_transition(Transition::default_to(next)));
    }
    definition.with_step(commit_step("end", "Closed"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_activity_ids_are_sequential(
        answers in prop::collection::vec(prop::sample::select(vec!["approved", "rejected", "other"]), 1..5),
    ) {
        let case = tokio_test::block_on(async {
            let engine = engine_with(review_chain(answers.len()), EngineSettings::default());
            let execution = engine.start("case-prop", "chain", "1", Value::Null);
            for (answered, answer) in answers.iter().enumerate() {
                execution
                    .wait_for_state(|case| {
                        case.active_interaction.is_some() && case.activity_stream.len() == answered + 1
                    })
                    .await
                    .unwrap();
                execution.decision(*answer).await.unwrap();
            }
            execution.result().await.unwrap()
        });

        prop_assert_eq!(case.activity_stream.len(), answers.len() + 1);
        for (index, item) in case.activity_stream.iter().enumerate() {
            prop_assert_eq!(item.id, index as u64 + 1);
        }
        prop_assert_eq!(case.status(), "Closed");
    }
}
