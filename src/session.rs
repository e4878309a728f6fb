//! Explicit per-session context: selected case, its profiles, filters and gate.
//!
//! `CaseSession` owns everything the core mutates. Nothing here renders;
//! outer layers call [`CaseSession::subscribe`] and react to [`SessionEvent`]s.
//!
//! Network operations (load, save, reset) consult the readiness gate first and
//! go through the request coordinator, so a superseded load never overwrites
//! the profiles of a newer one. In-memory edits are not gated.
use crate::adjust::{self, AdjustmentBaseline, AdjustmentProgress};
use crate::catalog::{GroupFilter, TraitCatalog};
use crate::coordinator::{classes, Completion, RequestCoordinator, RequestTicket};
use crate::error::{CoreError, ServiceError};
use crate::profile::{self, ProfileKey, ProfileMethodology, ProfileMode, ProfileSet, VqEstimates};
use crate::readiness::{GateVerdict, ReadinessGate, ReadinessReport};
use crate::service::{CaseProfiles, ProfileService, ReadinessService};
use crate::workflow::case_wizard::{self, CaseRecord, WizardContext};
use crate::workflow::operational::{self, OperationalContext};
use crate::workflow::{self, StepState, WorkflowMemory};
use serde::Serialize;
use std::sync::mpsc;
use std::sync::Arc;

/// State change notifications for observers.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    CaseSelected { case_id: i64 },
    CaseCleared,
    ProfilesLoaded { case_id: i64 },
    ProfilesSaved { case_id: i64 },
    ProfilesChanged { changed_traits: usize },
    MethodologyChanged { methodology: ProfileMethodology },
    ReadinessChanged { verdict: GateVerdict },
}

#[derive(Debug, Clone)]
struct ActiveCase {
    record: CaseRecord,
    profiles: Option<ProfileSet>,
    baseline: Option<AdjustmentBaseline>,
    methodology: ProfileMethodology,
    work_history_count: usize,
    analysis_result_count: usize,
    has_rendered_report: bool,
    wizard_memory: WorkflowMemory,
}

impl ActiveCase {
    fn new(record: CaseRecord, methodology: ProfileMethodology) -> Self {
        ActiveCase {
            record,
            profiles: None,
            baseline: None,
            methodology,
            work_history_count: 0,
            analysis_result_count: 0,
            has_rendered_report: false,
            wizard_memory: WorkflowMemory::new(),
        }
    }
}

/// Context object passed to every core operation of one user session.
#[derive(Debug)]
pub struct CaseSession {
    catalog: TraitCatalog,
    readiness: ReadinessGate,
    coordinator: Arc<RequestCoordinator>,
    default_methodology: ProfileMethodology,
    active: Option<ActiveCase>,
    focus: ProfileKey,
    group_filter: GroupFilter,
    operational_memory: WorkflowMemory,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
}

impl CaseSession {
    pub fn new(catalog: TraitCatalog) -> Self {
        Self::with_coordinator(catalog, Arc::new(RequestCoordinator::new()))
    }

    /// Share a coordinator with other sessions or host components.
    pub fn with_coordinator(catalog: TraitCatalog, coordinator: Arc<RequestCoordinator>) -> Self {
        CaseSession {
            catalog,
            readiness: ReadinessGate::new(),
            coordinator,
            default_methodology: ProfileMethodology::default(),
            active: None,
            focus: ProfileKey::Profile4,
            group_filter: GroupFilter::All,
            operational_memory: WorkflowMemory::new(),
            subscribers: Vec::new(),
        }
    }

    /// Methodology newly selected cases start with.
    pub fn set_default_methodology(&mut self, methodology: ProfileMethodology) {
        self.default_methodology = methodology;
    }

    pub fn catalog(&self) -> &TraitCatalog {
        &self.catalog
    }

    pub fn coordinator(&self) -> &Arc<RequestCoordinator> {
        &self.coordinator
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: SessionEvent) {
        // Dropped receivers unsubscribe themselves.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    // Readiness

    pub fn readiness(&self) -> GateVerdict {
        self.readiness.check()
    }

    pub fn readiness_report(&self) -> Option<&ReadinessReport> {
        self.readiness.report()
    }

    pub fn refresh_readiness(&mut self, service: &dyn ReadinessService) -> GateVerdict {
        let flipped = self.readiness.refresh(service);
        self.after_readiness_update(flipped)
    }

    pub fn set_readiness(&mut self, report: ReadinessReport) -> GateVerdict {
        let flipped = self.readiness.update(report);
        self.after_readiness_update(flipped)
    }

    fn after_readiness_update(&mut self, flipped: bool) -> GateVerdict {
        let verdict = self.readiness.check();
        if flipped {
            self.emit(SessionEvent::ReadinessChanged {
                verdict: verdict.clone(),
            });
        }
        verdict
    }

    // Case selection

    /// Make `record` the active case, discarding any loaded profiles.
    pub fn select_case(&mut self, record: CaseRecord) {
        let case_id = record.case_id;
        self.coordinator.cancel(classes::PROFILES);
        self.active = Some(ActiveCase::new(record, self.default_methodology));
        tracing::info!(case_id, "case selected");
        self.emit(SessionEvent::CaseSelected { case_id });
    }

    pub fn clear_case(&mut self) {
        if self.active.take().is_some() {
            self.coordinator.cancel(classes::PROFILES);
            self.emit(SessionEvent::CaseCleared);
        }
    }

    pub fn active_case(&self) -> Option<&CaseRecord> {
        self.active.as_ref().map(|active| &active.record)
    }

    /// Replace the active case's record (e.g. after an intake edit).
    pub fn update_case_record(&mut self, record: CaseRecord) -> Result<(), CoreError> {
        let active = self.active_mut()?;
        if active.record.case_id != record.case_id {
            return Err(CoreError::NoCaseSelected);
        }
        active.record = record;
        Ok(())
    }

    fn active_ref(&self) -> Result<&ActiveCase, CoreError> {
        self.active.as_ref().ok_or(CoreError::NoCaseSelected)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveCase, CoreError> {
        self.active.as_mut().ok_or(CoreError::NoCaseSelected)
    }

    pub fn profiles(&self) -> Option<&ProfileSet> {
        self.active.as_ref().and_then(|active| active.profiles.as_ref())
    }

    fn loaded_profiles(&self) -> Result<&ProfileSet, CoreError> {
        self.active_ref()?
            .profiles
            .as_ref()
            .ok_or(CoreError::ProfilesNotLoaded)
    }

    pub fn methodology(&self) -> ProfileMethodology {
        self.active
            .as_ref()
            .map(|active| active.methodology)
            .unwrap_or(self.default_methodology)
    }

    // Profile loading

    /// Start a profile load for the active case.
    ///
    /// Pair with [`CaseSession::complete_load_profiles`] once the service
    /// answers; starting another load cancels this one.
    pub fn begin_load_profiles(&self) -> Result<(i64, RequestTicket), CoreError> {
        let case_id = self.active_ref()?.record.case_id;
        self.readiness.ensure_pass()?;
        Ok((case_id, self.coordinator.begin(classes::PROFILES)))
    }

    /// Apply a profile service answer if `ticket` is still current.
    ///
    /// Superseded or cancelled answers are dropped whether they succeeded or failed.
    pub fn complete_load_profiles(
        &mut self,
        ticket: &RequestTicket,
        result: Result<CaseProfiles, ServiceError>,
    ) -> Result<Completion<()>, CoreError> {
        let Completion::Applied(result) = self.coordinator.complete(ticket, result) else {
            return Ok(Completion::Stale);
        };
        let loaded = match result {
            Ok(loaded) => loaded,
            // Aborted by `select_case`/`clear_case`; nothing to apply.
            Err(err) if err.is_cancelled() => return Ok(Completion::Stale),
            Err(err) => return Err(err.into()),
        };
        let catalog = &self.catalog;
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.record.case_id == loaded.case_id)
        else {
            tracing::debug!(case_id = loaded.case_id, "dropping profiles for unselected case");
            return Ok(Completion::Stale);
        };
        let set = profile::load(catalog, &loaded.raw, loaded.methodology)?;
        active.baseline = Some(AdjustmentBaseline::capture(&set));
        active.profiles = Some(set);
        active.methodology = loaded.methodology;
        let case_id = loaded.case_id;
        tracing::info!(case_id, mode = %loaded.methodology.mode, "profiles loaded");
        self.emit(SessionEvent::ProfilesLoaded { case_id });
        Ok(Completion::Applied(()))
    }

    /// Fetch and apply profiles for the active case in one call.
    pub fn load_profiles(
        &mut self,
        service: &dyn ProfileService,
        overrides: Option<ProfileMethodology>,
    ) -> Result<Completion<()>, CoreError> {
        let (case_id, ticket) = self.begin_load_profiles()?;
        let result = service.get_profiles(case_id, overrides, ticket.signal());
        self.complete_load_profiles(&ticket, result)
    }

    /// Persist the current profiles; the service's answer becomes the new baseline.
    pub fn save_profiles(&mut self, service: &dyn ProfileService) -> Result<Completion<()>, CoreError> {
        let (case_id, ticket) = self.begin_load_profiles()?;
        let profiles = self.loaded_profiles()?.clone();
        let result = service.save_profiles(case_id, &profiles, self.methodology(), ticket.signal());
        let completion = self.complete_load_profiles(&ticket, result)?;
        if completion.is_applied() {
            self.emit(SessionEvent::ProfilesSaved { case_id });
        }
        Ok(completion)
    }

    /// Force strict derivation with the residual cap, clear filters, and reload.
    ///
    /// Nothing changes unless the reload is applied; a failed or superseded
    /// reset leaves methodology, filters and profiles as they were.
    pub fn reset_to_derived(&mut self, service: &dyn ProfileService) -> Result<Completion<()>, CoreError> {
        let methodology = ProfileMethodology::default();
        let completion = self.load_profiles(service, Some(methodology))?;
        if completion.is_applied() {
            self.group_filter = GroupFilter::All;
            self.focus = ProfileKey::Profile2;
            self.emit(SessionEvent::MethodologyChanged { methodology });
        }
        Ok(completion)
    }

    // In-memory edits

    fn replace_profiles(&mut self, next: ProfileSet) -> usize {
        let mut changed = 0;
        if let Some(active) = self.active.as_mut() {
            if let Some(baseline) = active.baseline.as_ref() {
                changed = adjust::changed_trait_count(&next, baseline);
            }
            active.profiles = Some(next);
        }
        self.emit(SessionEvent::ProfilesChanged {
            changed_traits: changed,
        });
        changed
    }

    pub fn set_trait_value(
        &mut self,
        key: ProfileKey,
        index: usize,
        value: i32,
    ) -> Result<(), CoreError> {
        let next = profile::set_trait_value(
            &self.catalog,
            self.loaded_profiles()?,
            self.methodology(),
            key,
            index,
            value,
        )?;
        self.replace_profiles(next);
        Ok(())
    }

    /// Lower `target` by `amount` across the current group filter; focus follows.
    pub fn lower(&mut self, target: ProfileKey, amount: i32) -> Result<(), CoreError> {
        let next = adjust::lower(
            &self.catalog,
            self.loaded_profiles()?,
            self.methodology(),
            target,
            amount,
            self.group_filter,
        )?;
        self.focus = target;
        self.replace_profiles(next);
        Ok(())
    }

    /// Lower the focused vector.
    pub fn lower_focus(&mut self, amount: i32) -> Result<(), CoreError> {
        self.lower(self.focus(), amount)
    }

    pub fn copy_vector(&mut self, from: ProfileKey, to: ProfileKey) -> Result<(), CoreError> {
        let next = adjust::copy_vector(
            &self.catalog,
            self.loaded_profiles()?,
            self.methodology(),
            from,
            to,
        )?;
        self.focus = to;
        self.replace_profiles(next);
        Ok(())
    }

    /// Seed the residual profile from the pre-injury composite.
    pub fn copy_composite_to_residual(&mut self) -> Result<(), CoreError> {
        self.copy_vector(ProfileKey::Profile3, ProfileKey::Profile4)
    }

    pub fn set_mode(&mut self, mode: ProfileMode) -> Result<(), CoreError> {
        let methodology = ProfileMethodology {
            mode,
            ..self.methodology()
        };
        self.set_methodology(methodology)
    }

    pub fn set_residual_cap(&mut self, enforce: bool) -> Result<(), CoreError> {
        let methodology = ProfileMethodology {
            enforce_residual_cap: enforce,
            ..self.methodology()
        };
        self.set_methodology(methodology)
    }

    /// Switch methodology; override -> strict discards edits to profile1/profile3.
    pub fn set_methodology(&mut self, methodology: ProfileMethodology) -> Result<(), CoreError> {
        let from = self.methodology();
        let active = self.active.as_mut().ok_or(CoreError::NoCaseSelected)?;
        if from == methodology {
            return Ok(());
        }
        active.methodology = methodology;
        let next = active
            .profiles
            .as_ref()
            .map(|set| profile::switch_methodology(&self.catalog, set, from, methodology));
        self.emit(SessionEvent::MethodologyChanged { methodology });
        if let Some(next) = next {
            self.replace_profiles(next);
        }
        Ok(())
    }

    // Filters

    /// Effective focus: derivation-only vectors fall back to profile2 in strict mode.
    pub fn focus(&self) -> ProfileKey {
        adjust::effective_focus(self.focus, self.methodology())
    }

    pub fn set_focus(&mut self, key: ProfileKey) -> ProfileKey {
        self.focus = key;
        self.focus()
    }

    pub fn group_filter(&self) -> GroupFilter {
        self.group_filter
    }

    pub fn set_group_filter(&mut self, filter: GroupFilter) {
        self.group_filter = filter;
    }

    // Collaborator counts

    pub fn record_work_history_count(&mut self, count: usize) -> Result<(), CoreError> {
        self.active_mut()?.work_history_count = count;
        Ok(())
    }

    pub fn record_analysis_results(&mut self, count: usize) -> Result<(), CoreError> {
        self.active_mut()?.analysis_result_count = count;
        Ok(())
    }

    pub fn record_rendered_report(&mut self, rendered: bool) -> Result<(), CoreError> {
        self.active_mut()?.has_rendered_report = rendered;
        Ok(())
    }

    // Derived views

    pub fn changed_trait_count(&self) -> usize {
        self.active
            .as_ref()
            .and_then(|active| {
                let profiles = active.profiles.as_ref()?;
                let baseline = active.baseline.as_ref()?;
                Some(adjust::changed_trait_count(profiles, baseline))
            })
            .unwrap_or(0)
    }

    pub fn progress(&self) -> AdjustmentProgress {
        AdjustmentProgress {
            changed_traits: self.changed_trait_count(),
            focus: self.focus(),
            group_filter: self.group_filter.as_str().to_string(),
        }
    }

    pub fn vq_estimates(&self) -> Option<VqEstimates> {
        self.profiles().map(|set| set.vq_estimates(&self.catalog))
    }

    pub fn wizard_context(&self) -> WizardContext {
        match self.active.as_ref() {
            Some(active) => WizardContext {
                case: Some(active.record.clone()),
                work_history_count: active.work_history_count,
                profiles_loaded: active.profiles.is_some(),
                analysis_result_count: active.analysis_result_count,
                has_rendered_report: active.has_rendered_report,
            },
            None => WizardContext::default(),
        }
    }

    /// Evaluate the case wizard, carrying the done-ratchet for the active case.
    pub fn case_workflow(&mut self) -> Vec<StepState> {
        let context = self.wizard_context();
        let verdict = self.readiness.check();
        let memory = self
            .active
            .as_ref()
            .map(|active| active.wizard_memory.clone())
            .unwrap_or_default();
        let evaluation = workflow::evaluate(&case_wizard::STEPS, &context, &verdict, &memory);
        if let Some(active) = self.active.as_mut() {
            active.wizard_memory = evaluation.memory;
        }
        evaluation.steps
    }

    /// Evaluate the operational workflow for host-supplied state.
    ///
    /// The ratchet memory lives on the session, not the case, since the
    /// operational flow spans region and client selection.
    pub fn operational_workflow(&mut self, context: &OperationalContext) -> Vec<StepState> {
        let verdict = self.readiness.check();
        let evaluation = workflow::evaluate(
            &operational::STEPS,
            context,
            &verdict,
            &self.operational_memory,
        );
        self.operational_memory = evaluation.memory;
        evaluation.steps
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
