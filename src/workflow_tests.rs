use super::case_wizard::{self, CaseRecord, WizardContext};
use super::operational::{self, AnalysisMode, OperationalContext};
use super::{current_step_summary, evaluate, StepDefinition, StepStatus, WorkflowMemory};
use crate::readiness::GateVerdict;

fn passing() -> GateVerdict {
    GateVerdict {
        pass: true,
        reason: None,
        remediation: Vec::new(),
    }
}

fn failing(reason: &str) -> GateVerdict {
    GateVerdict {
        pass: false,
        reason: Some(reason.to_string()),
        remediation: vec!["rebuild the database".to_string()],
    }
}

fn complete_case() -> CaseRecord {
    CaseRecord {
        case_id: 7,
        first_name: Some("Ada".to_string()),
        last_name: Some("Byron".to_string()),
        address_line1: Some("1 Main St".to_string()),
        city: Some("Springfield".to_string()),
        postal_code: Some("12345".to_string()),
        demographic_state_id: Some(12),
        demographic_county_id: None,
        reason_for_referral: Some("return to work".to_string()),
    }
}

fn complete_wizard() -> WizardContext {
    WizardContext {
        case: Some(complete_case()),
        work_history_count: 2,
        profiles_loaded: true,
        analysis_result_count: 3,
        has_rendered_report: true,
    }
}

fn complete_operational() -> OperationalContext {
    OperationalContext {
        region_run_executed: true,
        client: Some(complete_case()),
        region_has_counties: false,
        psychometric_result_count: 1,
        analysis_mode: AnalysisMode::Match,
        analysis_result_count: 5,
        selected_job: Some("007.061-014".to_string()),
        detail_loaded_job: Some("007.061-014".to_string()),
        has_rendered_report: true,
        saved_report_ids: vec![4, 7],
        last_packet_report_id: Some(7),
    }
}

fn evaluate_statuses<C>(
    table: &[StepDefinition<C>],
    ctx: &C,
    readiness: &GateVerdict,
    memory: &WorkflowMemory,
) -> (Vec<StepStatus>, WorkflowMemory) {
    let evaluation = evaluate(table, ctx, readiness, memory);
    let statuses = evaluation.steps.iter().map(|step| step.status).collect();
    (statuses, evaluation.memory)
}

#[test]
fn readiness_failure_blocks_every_step_after_the_first() {
    let evaluation = evaluate(
        &case_wizard::STEPS,
        &complete_wizard(),
        &failing("Trait table is empty."),
        &WorkflowMemory::new(),
    );
    assert_eq!(evaluation.steps[0].status, StepStatus::Done);
    for step in &evaluation.steps[1..] {
        assert_eq!(step.status, StepStatus::Blocked, "{}", step.id);
        assert_eq!(step.detail, "Trait table is empty.");
    }
}

#[test]
fn complete_wizard_is_all_done() {
    let (statuses, memory) = evaluate_statuses(
        &case_wizard::STEPS,
        &complete_wizard(),
        &passing(),
        &WorkflowMemory::new(),
    );
    assert!(statuses.iter().all(|status| *status == StepStatus::Done));
    assert_eq!(memory.len(), 6);
}

#[test]
fn done_steps_survive_upstream_regression() {
    let (_, memory) = evaluate_statuses(
        &case_wizard::STEPS,
        &complete_wizard(),
        &passing(),
        &WorkflowMemory::new(),
    );
    let mut regressed = complete_wizard();
    regressed.work_history_count = 0;
    let (statuses, memory) = evaluate_statuses(&case_wizard::STEPS, &regressed, &passing(), &memory);
    assert_eq!(
        statuses,
        vec![
            StepStatus::Done,
            StepStatus::Done,
            StepStatus::InProgress,
            StepStatus::Done,
            StepStatus::Done,
            StepStatus::Done,
        ]
    );
    assert!(!memory.is_done("work-history"));
    assert!(memory.is_done("profiles"));
}

#[test]
fn own_condition_failing_demotes_a_done_step() {
    let (_, memory) = evaluate_statuses(
        &case_wizard::STEPS,
        &complete_wizard(),
        &passing(),
        &WorkflowMemory::new(),
    );
    let mut cleared = complete_wizard();
    if let Some(case) = cleared.case.as_mut() {
        case.city = Some("  ".to_string());
    }
    cleared.profiles_loaded = false;
    let (statuses, memory) = evaluate_statuses(&case_wizard::STEPS, &cleared, &passing(), &memory);
    assert_eq!(statuses[1], StepStatus::InProgress);
    assert_eq!(statuses[3], StepStatus::InProgress);
    assert_eq!(statuses[4], StepStatus::Done);
    assert!(!memory.is_done("intake"));
    assert!(!memory.is_done("profiles"));
}

#[test]
fn unmet_dependency_blocks_downstream_steps() {
    let ctx = WizardContext {
        case: Some(complete_case()),
        work_history_count: 0,
        profiles_loaded: true,
        analysis_result_count: 0,
        has_rendered_report: false,
    };
    let evaluation = evaluate(&case_wizard::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    let profiles = &evaluation.steps[3];
    assert_eq!(profiles.status, StepStatus::Blocked);
    assert_eq!(profiles.detail, "Complete \"Work History DOTs\" first.");
    assert_eq!(evaluation.steps[4].status, StepStatus::Blocked);
    assert_eq!(evaluation.steps[5].status, StepStatus::Blocked);
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: blocked at \"Profiles\" - Complete \"Work History DOTs\" first."
    );
}

#[test]
fn no_case_blocks_everything_after_welcome() {
    let evaluation = evaluate(
        &case_wizard::STEPS,
        &WizardContext::default(),
        &passing(),
        &WorkflowMemory::new(),
    );
    assert_eq!(evaluation.steps[0].status, StepStatus::InProgress);
    assert_eq!(evaluation.steps[1].detail, "Complete \"Welcome Cases\" first.");
    assert!(evaluation.steps[1..]
        .iter()
        .all(|step| step.status == StepStatus::Blocked));
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: blocked at \"Intake\" - Complete \"Welcome Cases\" first."
    );
}

#[test]
fn incomplete_intake_blocks_recorded_work_history() {
    let mut ctx = complete_wizard();
    if let Some(case) = ctx.case.as_mut() {
        case.reason_for_referral = None;
    }
    let evaluation = evaluate(&case_wizard::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(evaluation.steps[1].status, StepStatus::InProgress);
    assert_eq!(evaluation.steps[2].status, StepStatus::Blocked);
    assert_eq!(evaluation.steps[2].detail, "Complete \"Intake\" first.");
    assert!(evaluation.steps[3..]
        .iter()
        .all(|step| step.status == StepStatus::Blocked));
    assert!(!evaluation.memory.is_done("work-history"));
}

#[test]
fn readiness_failure_does_not_erase_the_ratchet() {
    let (_, memory) = evaluate_statuses(
        &case_wizard::STEPS,
        &complete_wizard(),
        &passing(),
        &WorkflowMemory::new(),
    );
    let (_, during_outage) = evaluate_statuses(
        &case_wizard::STEPS,
        &complete_wizard(),
        &failing("database offline"),
        &memory,
    );
    assert_eq!(during_outage, memory);
}

#[test]
fn operational_workflow_completes_and_ignores_optional_step_in_summary() {
    let mut ctx = complete_operational();
    let evaluation = evaluate(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert!(evaluation
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Done));
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: workflow complete."
    );

    ctx.psychometric_result_count = 0;
    let evaluation = evaluate(&operational::STEPS, &ctx, &passing(), &evaluation.memory);
    assert_eq!(evaluation.steps[4].status, StepStatus::InProgress);
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: workflow complete."
    );
}

#[test]
fn operational_readiness_failure_blocks_data_step_with_reason() {
    let evaluation = evaluate(
        &operational::STEPS,
        &complete_operational(),
        &failing("Trait table is empty."),
        &WorkflowMemory::new(),
    );
    assert!(evaluation
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Blocked));
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: blocked at \"Verify Data Load\" - Trait table is empty."
    );
}

#[test]
fn target_job_requires_loaded_detail_and_completed_run() {
    let mut ctx = complete_operational();
    ctx.detail_loaded_job = Some("000.000-000".to_string());
    let (statuses, _) = evaluate_statuses(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(statuses[6], StepStatus::InProgress);
    assert_eq!(statuses[7], StepStatus::Blocked);

    let mut ctx = complete_operational();
    ctx.analysis_mode = AnalysisMode::Search;
    let (statuses, _) = evaluate_statuses(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(statuses[5], StepStatus::InProgress);
    assert_eq!(statuses[6], StepStatus::Blocked);
}

#[test]
fn county_is_required_only_when_the_state_has_counties() {
    let mut ctx = complete_operational();
    ctx.region_has_counties = true;
    let (statuses, _) = evaluate_statuses(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(statuses[3], StepStatus::InProgress);

    if let Some(client) = ctx.client.as_mut() {
        client.demographic_county_id = Some(3);
    }
    let (statuses, _) = evaluate_statuses(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(statuses[3], StepStatus::Done);
}

fn assert_dependencies_point_backwards<C>(table: &[StepDefinition<C>]) {
    for (index, def) in table.iter().enumerate() {
        for dep in def.depends_on {
            let position = table.iter().position(|row| row.id == *dep);
            assert!(
                position.is_some_and(|position| position < index),
                "{} depends on {dep} which is not an earlier step",
                def.id
            );
        }
    }
}

#[test]
fn step_tables_only_depend_on_earlier_steps() {
    assert_dependencies_point_backwards(&case_wizard::STEPS);
    assert_dependencies_point_backwards(&operational::STEPS);
}

fn assert_required_steps_chain<C>(table: &[StepDefinition<C>]) {
    assert!(table[0].depends_on.is_empty());
    let required: Vec<_> = table.iter().filter(|def| !def.optional).collect();
    for pair in required.windows(2) {
        assert_eq!(pair[1].depends_on, &[pair[0].id], "{}", pair[1].id);
    }
}

#[test]
fn required_steps_depend_on_their_predecessor() {
    assert_required_steps_chain(&case_wizard::STEPS);
    assert_required_steps_chain(&operational::STEPS);
}

#[test]
fn optional_step_gates_nothing() {
    let mut ctx = complete_operational();
    ctx.psychometric_result_count = 0;
    let evaluation = evaluate(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(evaluation.steps[4].status, StepStatus::InProgress);
    assert!(evaluation
        .steps
        .iter()
        .filter(|step| !step.optional)
        .all(|step| step.status == StepStatus::Done));
}

#[test]
fn operational_steps_wait_on_their_predecessor() {
    let mut ctx = complete_operational();
    ctx.region_run_executed = false;
    let evaluation = evaluate(&operational::STEPS, &ctx, &passing(), &WorkflowMemory::new());
    assert_eq!(evaluation.steps[1].status, StepStatus::InProgress);
    assert_eq!(evaluation.steps[2].status, StepStatus::Blocked);
    assert_eq!(evaluation.steps[2].detail, "Complete \"Set Search Region\" first.");
    assert!(evaluation.steps[2..]
        .iter()
        .all(|step| step.status == StepStatus::Blocked));
    assert_eq!(
        current_step_summary(&evaluation.steps),
        "Current step: blocked at \"Create or Select Client\" - Complete \"Set Search Region\" first."
    );
}
