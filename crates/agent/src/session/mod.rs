//! Session Protocol
//!
//! Orchestrates one triage interview: intake, emergency screening and
//! verification, slot parsing, periodic planner profile extraction, the
//! arbiter decision and the branch it selects. Exactly one turn is
//! processed at a time; the planner is the only suspension point.
//!
//! Planner failures never escape a turn. At start they switch the session
//! to the offline decision tree; mid-session they degrade to a
//! deterministic action or a flagged safety-fail termination.

pub mod lock;
pub mod reconcile;
pub mod state;
pub mod verification;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use triage_core::{
    collect_stream, AnswerRecord, ArbiterResult, ArbiterSignal, ArbiterState,
    AssessmentQuestion, ClinicalProfile, EmergencyOverride, Planner, SessionSummary, Turn,
    TurnRole,
};
use triage_text_processing::DetectionOptions;

use crate::arbiter::ArbiterInput;
use crate::engine::TriageEngine;
use crate::SessionError;

pub use lock::{TurnGuard, TurnLock};
pub use reconcile::reconcile;
pub use state::{SessionMode, SessionPhase};
pub use verification::{classify_answer, PendingVerification, VerificationAnswer};

use state::{Asking, SessionState};

const YES_NO: [&str; 2] = ["Yes", "No"];

/// Kind of question being presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Planned,
    FollowUp,
    Clarification,
    Offline,
}

/// A question for the patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Transition text shown before the question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    pub kind: PromptKind,
}

impl Prompt {
    fn from_asking(asking: &Asking, bridge: Option<String>) -> Self {
        let (id, options, kind) = match asking {
            Asking::Planned(q) => (q.id.clone(), q.options.clone(), PromptKind::Planned),
            Asking::Expansion(q) => (q.id.clone(), q.options.clone(), PromptKind::FollowUp),
            Asking::Clarification(q) => (q.id.clone(), q.options.clone(), PromptKind::Clarification),
            Asking::Offline { node_id, options, .. } => {
                (node_id.clone(), options.clone(), PromptKind::Offline)
            },
        };
        Self {
            id,
            text: asking.text().to_string(),
            options,
            bridge,
            kind,
        }
    }
}

/// Result of one processed turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Ask the patient this next
    Question(Prompt),
    /// Interview halted; the patient must confirm the detected emergency
    VerifyEmergency {
        prompt: String,
        keywords: Vec<String>,
    },
    /// Confirmed emergency; the session has ended
    Emergency(Box<EmergencyOverride>),
    /// Assessment finished; the session has ended
    Complete(Box<SessionSummary>),
}

impl TurnOutcome {
    pub fn is_final(&self) -> bool {
        matches!(self, TurnOutcome::Emergency(_) | TurnOutcome::Complete(_))
    }
}

/// Session events
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started { session_id: String },
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    EmergencyFlagged { score: u8, keywords: Vec<String> },
    EmergencyVerified { answer: VerificationAnswer },
    Signal { signal: ArbiterSignal, reason: String },
    OfflineFallback { reason: String },
    Ended { reason: String },
}

/// One patient's triage interview
pub struct TriageSession<P: Planner + ?Sized> {
    id: String,
    planner: Arc<P>,
    engine: TriageEngine,
    state: Mutex<SessionState>,
    lock: TurnLock,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<P: Planner + ?Sized> TriageSession<P> {
    pub fn new(planner: Arc<P>, engine: TriageEngine) -> Self {
        let timeout = Duration::from_millis(engine.session_config().turn_lock_timeout_ms);
        let (event_tx, _) = broadcast::channel(64);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            planner,
            engine,
            state: Mutex::new(SessionState::new()),
            lock: TurnLock::new(timeout),
            event_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    pub fn mode(&self) -> SessionMode {
        self.state.lock().mode.clone()
    }

    pub fn profile(&self) -> ClinicalProfile {
        self.state.lock().profile.clone()
    }

    pub fn history(&self) -> Vec<Turn> {
        self.state.lock().history.clone()
    }

    pub fn is_ended(&self) -> bool {
        self.state.lock().ended
    }

    /// A turn is currently in flight
    pub fn is_busy(&self) -> bool {
        self.lock.is_held()
    }

    pub fn suppressed_keywords(&self) -> Vec<String> {
        self.state.lock().suppressed_keywords.clone()
    }

    pub fn pending_verification(&self) -> Option<PendingVerification> {
        self.state.lock().pending_verification.clone()
    }

    /// Questions left on the longest offline path, when running offline
    pub fn offline_remaining_steps(&self) -> Option<usize> {
        match &self.state.lock().mode {
            SessionMode::Offline { node_id } => Some(self.engine.offline().remaining_steps(node_id)),
            SessionMode::Planned => None,
        }
    }

    /// Begin the interview with the patient's opening complaint
    pub async fn start(
        &self,
        symptoms: &str,
        patient_name: Option<&str>,
    ) -> Result<TurnOutcome, SessionError> {
        let _guard = self.lock.try_acquire().ok_or(SessionError::Busy)?;
        let symptoms = symptoms.trim();
        if symptoms.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        {
            let mut state = self.state.lock();
            if state.ended {
                return Err(SessionError::Ended);
            }
            if state.started {
                return Err(SessionError::AlreadyStarted);
            }
            state.started = true;
            state.symptoms = symptoms.to_string();
            state.patient_name = patient_name.map(String::from);
            state.profile.primary_complaint = Some(symptoms.to_string());
            state.history.push(Turn::user(symptoms));
            let parsed = state.slots.parse_turn(symptoms);
            state.profile = reconcile(state.profile.clone(), &parsed.aggregated);

            tracing::info!(session_id = %self.id, "Triage session started");
            let _ = self.event_tx.send(SessionEvent::Started {
                session_id: self.id.clone(),
            });

            if let Some(outcome) = self.screen(&mut state, symptoms, true) {
                return Ok(outcome);
            }
        }

        self.begin_interview().await
    }

    /// Process the patient's reply to the current prompt
    ///
    /// While an emergency verification is pending the reply is classified as
    /// a verification answer; an unrecognizable reply yields
    /// `SessionError::VerificationPending`.
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let _guard = self.lock.try_acquire().ok_or(SessionError::Busy)?;
        let text = text.trim();

        let verifying = {
            let state = self.state.lock();
            Self::ensure_active(&state)?;
            state.pending_verification.is_some()
        };

        if verifying {
            let answer = classify_answer(text).ok_or(SessionError::VerificationPending)?;
            self.state.lock().history.push(Turn::user(text));
            return self.apply_verification(answer).await;
        }

        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        {
            let mut state = self.state.lock();
            state.history.push(Turn::user(text));
            if let Some(outcome) = self.screen(&mut state, text, false) {
                return Ok(outcome);
            }
        }

        self.resume_with(text).await
    }

    /// Answer a pending emergency verification directly
    pub async fn resolve_verification(
        &self,
        answer: VerificationAnswer,
    ) -> Result<TurnOutcome, SessionError> {
        let _guard = self.lock.try_acquire().ok_or(SessionError::Busy)?;
        {
            let state = self.state.lock();
            Self::ensure_active(&state)?;
        }
        self.apply_verification(answer).await
    }

    fn ensure_active(state: &SessionState) -> Result<(), SessionError> {
        if !state.started {
            return Err(SessionError::NotStarted);
        }
        if state.ended {
            return Err(SessionError::Ended);
        }
        Ok(())
    }

    fn set_phase(&self, state: &mut SessionState, to: SessionPhase) {
        let from = state.phase;
        if from == to {
            return;
        }
        state.phase = to;
        tracing::info!(session_id = %self.id, %from, %to, "Session phase changed");
        let _ = self.event_tx.send(SessionEvent::PhaseChanged { from, to });
    }

    fn end(&self, state: &mut SessionState, reason: &str) {
        self.set_phase(state, SessionPhase::Generating);
        state.ended = true;
        state.asking = None;
        tracing::info!(session_id = %self.id, reason, "Triage session ended");
        let _ = self.event_tx.send(SessionEvent::Ended {
            reason: reason.to_string(),
        });
    }

    /// Run the emergency detector over user text; halts into verification
    /// when it fires
    fn screen(&self, state: &mut SessionState, text: &str, during_intake: bool) -> Option<TurnOutcome> {
        let is_red_flag = state.asking.as_ref().map(Asking::is_red_flag).unwrap_or(false);
        let options = DetectionOptions::default()
            .with_profile(&state.profile)
            .red_flag_question(is_red_flag)
            .suppressing(&state.suppressed_keywords);
        let detection = self.engine.detector().evaluate(text, &options);

        if !detection.is_emergency {
            return None;
        }

        tracing::warn!(
            session_id = %self.id,
            score = detection.score,
            keywords = ?detection.matched_keywords,
            "Emergency detected, awaiting verification"
        );
        let _ = self.event_tx.send(SessionEvent::EmergencyFlagged {
            score: detection.score,
            keywords: detection.matched_keywords.clone(),
        });

        let pending = PendingVerification {
            text: text.to_string(),
            detection,
            during_intake,
        };
        let prompt = pending.prompt();
        let keywords = pending.detection.matched_keywords.clone();
        state.history.push(Turn::assistant(prompt.clone()));
        state.pending_verification = Some(pending);
        Some(TurnOutcome::VerifyEmergency { prompt, keywords })
    }

    async fn apply_verification(&self, answer: VerificationAnswer) -> Result<TurnOutcome, SessionError> {
        let pending = {
            let mut state = self.state.lock();
            let pending = state
                .pending_verification
                .take()
                .ok_or(SessionError::NoPendingVerification)?;

            let _ = self.event_tx.send(SessionEvent::EmergencyVerified { answer });
            let keywords = &pending.detection.matched_keywords;

            match answer {
                VerificationAnswer::HappeningNow => {
                    let payload = EmergencyOverride::from_detection(&pending.text, &pending.detection);
                    self.end(&mut state, "Emergency confirmed by patient");
                    return Ok(TurnOutcome::Emergency(Box::new(payload)));
                },
                VerificationAnswer::RecentlyResolved => {
                    state.recently_resolved = true;
                    state.resolved_keyword = pending.detection.primary_keyword().map(String::from);
                    state.suppress(keywords);
                    tracing::info!(
                        session_id = %self.id,
                        keyword = ?state.resolved_keyword,
                        "Emergency symptom recently resolved, continuing conservatively"
                    );
                },
                VerificationAnswer::Denied => {
                    state.suppress(keywords);
                    tracing::warn!(
                        session_id = %self.id,
                        keywords = ?keywords,
                        "Emergency keywords denied and suppressed for the session"
                    );
                },
            }
            pending
        };

        if pending.during_intake {
            self.begin_interview().await
        } else {
            self.resume_with(&pending.text).await
        }
    }

    /// Continue an already-screened answer in the current mode
    async fn resume_with(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let mode = self.state.lock().mode.clone();
        match mode {
            SessionMode::Planned => self.process_answer(text).await,
            SessionMode::Offline { node_id } => self.offline_answer(&node_id, text),
        }
    }

    async fn begin_interview(&self) -> Result<TurnOutcome, SessionError> {
        let (symptoms, name) = {
            let state = self.state.lock();
            (state.symptoms.clone(), state.patient_name.clone())
        };

        match self
            .planner
            .generate_assessment_plan(&symptoms, None, name.as_deref())
            .await
        {
            Ok(plan) if !plan.questions.is_empty() => {
                let mut state = self.state.lock();
                tracing::info!(
                    session_id = %self.id,
                    questions = plan.questions.len(),
                    "Assessment plan received"
                );
                state.queue = plan.questions.into();
                self.set_phase(&mut state, SessionPhase::FollowUp);
                let intro = Some(plan.intro).filter(|i| !i.trim().is_empty());
                match state.queue.pop_front() {
                    Some(first) => Ok(self.present(&mut state, Asking::Planned(first), intro)),
                    None => Err(SessionError::Ended),
                }
            },
            Ok(_) => self.enter_offline("Planner returned an empty plan"),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Plan generation failed");
                self.enter_offline(&e.to_string())
            },
        }
    }

    fn enter_offline(&self, reason: &str) -> Result<TurnOutcome, SessionError> {
        let step = self.engine.offline().start()?;
        let mut state = self.state.lock();
        state.mode = SessionMode::Offline {
            node_id: step.id.to_string(),
        };
        self.set_phase(&mut state, SessionPhase::FollowUp);
        tracing::warn!(session_id = %self.id, reason, "Falling back to offline triage flow");
        let _ = self.event_tx.send(SessionEvent::OfflineFallback {
            reason: reason.to_string(),
        });

        let asking = Asking::Offline {
            node_id: step.id.to_string(),
            text: step.node.text().to_string(),
            options: step.node.options().iter().map(|o| o.label.clone()).collect(),
        };
        Ok(self.present(&mut state, asking, None))
    }

    fn offline_answer(&self, node_id: &str, text: &str) -> Result<TurnOutcome, SessionError> {
        let step = match self.engine.offline().step(node_id, text) {
            Ok(step) => step,
            Err(e) => {
                // A rejected answer leaves no trace in the transcript
                let mut state = self.state.lock();
                let stray = state
                    .history
                    .last()
                    .map_or(false, |t| t.role == TurnRole::User && t.content == text);
                if stray {
                    state.history.pop();
                }
                return Err(e.into());
            },
        };
        let mut state = self.state.lock();

        if let Some(asking) = state.asking.take() {
            state.answers.push(AnswerRecord::new(asking.text(), text));
        }
        state.turn_count += 1;
        let parsed = state.slots.parse_turn(text);
        state.profile = reconcile(state.profile.clone(), &parsed.aggregated);
        state.mode = SessionMode::Offline {
            node_id: step.id.to_string(),
        };

        if step.is_outcome {
            let recommendation = step.node.recommendation().unwrap_or_default();
            let reason = format!("Offline outcome {}: {}", step.id, recommendation);
            let summary = Self::summary(&state, &reason, false, step.node.text().to_string());
            self.end(&mut state, &reason);
            return Ok(TurnOutcome::Complete(Box::new(summary)));
        }

        let asking = Asking::Offline {
            node_id: step.id.to_string(),
            text: step.node.text().to_string(),
            options: step.node.options().iter().map(|o| o.label.clone()).collect(),
        };
        Ok(self.present(&mut state, asking, None))
    }

    /// Record the answer, refresh the profile, consult the arbiter and act
    async fn process_answer(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let due_history = {
            let mut state = self.state.lock();
            let asking = state.asking.take();
            let is_clarification = matches!(asking, Some(Asking::Clarification(_)));
            if let Some(asking) = &asking {
                state.answers.push(AnswerRecord::new(asking.text(), text));
            }
            if !is_clarification {
                state.turn_count += 1;
            }
            state.answers_since_extraction += 1;

            let parsed = state.slots.parse_turn(text);
            state.profile = reconcile(state.profile.clone(), &parsed.aggregated);

            let interval = self.engine.session_config().profile_extraction_interval.max(1);
            let due = is_clarification || state.answers_since_extraction >= interval;
            due.then(|| state.history.clone())
        };

        if let Some(history) = due_history {
            self.refresh_profile(&history).await;
        }

        let result = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let total_planned = state.total_planned();
            let decision = {
                let remaining: &[AssessmentQuestion] = state.queue.make_contiguous();
                let input = ArbiterInput {
                    history: &state.history,
                    profile: &state.profile,
                    current_turn: state.turn_count,
                    total_planned,
                    remaining_questions: remaining,
                    previous_profile: state.last_evaluated.as_ref(),
                    clarification_attempts: state.clarification_attempts,
                };
                self.engine.arbiter().evaluate(&input, state.arbiter_state)
            };
            state.arbiter_state = decision.state;
            state.profile = decision.profile;
            state.last_evaluated = Some(state.profile.clone());

            let _ = self.event_tx.send(SessionEvent::Signal {
                signal: decision.result.signal,
                reason: decision.result.reason.clone(),
            });
            decision.result
        };

        self.dispatch(result, text).await
    }

    async fn refresh_profile(&self, history: &[Turn]) {
        match self.planner.extract_clinical_profile(history, None).await {
            Ok(extracted) => {
                let mut state = self.state.lock();
                state.profile = Self::merge_extracted(&state, extracted);
                state.answers_since_extraction = 0;
                tracing::debug!(
                    session_id = %self.id,
                    readiness = state.profile.readiness(),
                    "Clinical profile refreshed"
                );
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Profile extraction failed, keeping previous profile");
            },
        }
    }

    fn merge_extracted(state: &SessionState, extracted: ClinicalProfile) -> ClinicalProfile {
        let mut profile = extracted.clamped();
        if profile.primary_complaint.is_none() {
            profile.primary_complaint = Some(state.symptoms.clone());
        }
        profile.is_vulnerable |= state.profile.is_vulnerable;
        reconcile(profile, state.slots.slots())
    }

    async fn dispatch(&self, result: ArbiterResult, last_answer: &str) -> Result<TurnOutcome, SessionError> {
        match result.signal {
            ArbiterSignal::Terminate => self.finalize(&result.reason, false).await,
            ArbiterSignal::PrioritizeRedFlags => {
                let ids = result.next_steps.unwrap_or_default();
                self.state.lock().prioritize_red_flags(&ids);
                self.advance(last_answer).await
            },
            ArbiterSignal::ResolveAmbiguity => {
                self.state.lock().prioritize_depth();
                self.advance(last_answer).await
            },
            ArbiterSignal::DrillDown => self.drill_down(&result.reason, last_answer).await,
            ArbiterSignal::RequireClarification => self.clarify(&result, last_answer).await,
            ArbiterSignal::Continue => self.advance(last_answer).await,
        }
    }

    /// Ask the next queued question, expanding the plan when it runs dry
    async fn advance(&self, last_answer: &str) -> Result<TurnOutcome, SessionError> {
        let next = {
            let mut state = self.state.lock();
            state.queue.pop_front().map(|q| (q, state.queue_suspended))
        };

        match next {
            Some((question, suspended)) => {
                let bridge = if suspended {
                    self.bridge(last_answer, &question.text).await
                } else {
                    None
                };
                let mut state = self.state.lock();
                state.queue_suspended = false;
                Ok(self.present(&mut state, Asking::Planned(question), bridge))
            },
            None => match self.request_follow_up("Planned questions exhausted").await {
                Some(question) => {
                    let mut state = self.state.lock();
                    Ok(self.present(&mut state, Asking::Expansion(question), None))
                },
                None => {
                    self.finalize(
                        "Question queue exhausted and no follow-up question could be generated",
                        true,
                    )
                    .await
                },
            },
        }
    }

    async fn drill_down(&self, reason: &str, last_answer: &str) -> Result<TurnOutcome, SessionError> {
        match self.request_follow_up(reason).await {
            Some(question) => {
                let mut state = self.state.lock();
                state.queue_suspended = !state.queue.is_empty();
                Ok(self.present(&mut state, Asking::Expansion(question), None))
            },
            None => {
                self.state.lock().prioritize_depth();
                self.advance(last_answer).await
            },
        }
    }

    async fn clarify(&self, result: &ArbiterResult, last_answer: &str) -> Result<TurnOutcome, SessionError> {
        let max = self.engine.session_config().max_clarifications;
        let question = {
            let mut state = self.state.lock();
            if state.clarification_attempts >= max {
                None
            } else {
                state.clarification_attempts += 1;
                if result.needs_reset {
                    state.profile.triage_readiness_score = None;
                    state.arbiter_state = ArbiterState::new();
                }
                Some(
                    AssessmentQuestion::new(
                        format!("clarify-{}", state.clarification_attempts),
                        clarification_text(&state.profile),
                    )
                    .with_options(YES_NO.iter().map(|s| s.to_string()).collect()),
                )
            }
        };

        match question {
            Some(question) => {
                let mut state = self.state.lock();
                Ok(self.present(&mut state, Asking::Clarification(question), None))
            },
            None => {
                tracing::debug!(session_id = %self.id, "Clarification cap reached, continuing");
                self.advance(last_answer).await
            },
        }
    }

    async fn request_follow_up(&self, context: &str) -> Option<AssessmentQuestion> {
        let profile = {
            let state = self.state.lock();
            if state.expansions >= self.engine.session_config().max_expansions {
                tracing::debug!(session_id = %self.id, "Expansion cap reached");
                return None;
            }
            state.profile.clone()
        };

        match self.planner.generate_immediate_follow_up(&profile, context).await {
            Ok(question) => {
                self.state.lock().expansions += 1;
                Some(question)
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Follow-up generation failed");
                None
            },
        }
    }

    async fn bridge(&self, last_answer: &str, next_question: &str) -> Option<String> {
        match self.planner.generate_bridge_message(last_answer, next_question).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Bridge message failed");
                None
            },
        }
    }

    /// Final extraction, narrative, summary payload
    async fn finalize(&self, reason: &str, safety_fail: bool) -> Result<TurnOutcome, SessionError> {
        let history = {
            let mut state = self.state.lock();
            self.set_phase(&mut state, SessionPhase::Review);
            state.history.clone()
        };
        if safety_fail {
            tracing::warn!(session_id = %self.id, reason, "Terminating with safety fail");
        }

        match self.planner.extract_clinical_profile(&history, None).await {
            Ok(extracted) => {
                let mut state = self.state.lock();
                state.profile = Self::merge_extracted(&state, extracted);
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Final profile extraction failed");
            },
        }

        let prompt = {
            let state = self.state.lock();
            narrative_prompt(&state.symptoms, &state.answers)
        };
        let narrative = match self.planner.stream_response(&prompt).await {
            Ok(stream) => collect_stream(stream).await.unwrap_or_else(|e| {
                tracing::warn!(session_id = %self.id, error = %e, "Narrative stream failed");
                String::new()
            }),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Narrative request failed");
                String::new()
            },
        };

        let mut state = self.state.lock();
        let summary = Self::summary(&state, reason, safety_fail, narrative.trim().to_string());
        self.end(&mut state, reason);
        Ok(TurnOutcome::Complete(Box::new(summary)))
    }

    fn summary(state: &SessionState, reason: &str, safety_fail: bool, narrative: String) -> SessionSummary {
        SessionSummary {
            symptoms: state.symptoms.clone(),
            answers: state.answers.clone(),
            extracted_profile: state.profile.clone(),
            is_recent_resolved: state.recently_resolved.then_some(true),
            resolved_keyword: state.resolved_keyword.clone(),
            termination_reason: reason.to_string(),
            safety_fail,
            narrative,
        }
    }

    fn present(&self, state: &mut SessionState, asking: Asking, bridge: Option<String>) -> TurnOutcome {
        let prompt = Prompt::from_asking(&asking, bridge);
        let spoken = match &prompt.bridge {
            Some(bridge) => format!("{} {}", bridge, prompt.text),
            None => prompt.text.clone(),
        };
        state.history.push(Turn::assistant(spoken));
        state.asking = Some(asking);
        TurnOutcome::Question(prompt)
    }
}

fn clarification_text(profile: &ClinicalProfile) -> String {
    match profile.red_flag_denials.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(denials) => format!(
            "Just to be sure, you are not experiencing any of these: {}? Please answer yes or no.",
            denials.trim()
        ),
        None => "Some of your answers seemed to conflict. Is everything you have told me so far correct? Please answer yes or no."
            .to_string(),
    }
}

fn narrative_prompt(symptoms: &str, answers: &[AnswerRecord]) -> String {
    let mut prompt = format!(
        "Summarize this triage interview in two or three plain sentences for the patient.\nPresenting complaint: {}\n",
        symptoms
    );
    for record in answers {
        prompt.push_str(&format!("Q: {}\nA: {}\n", record.question, record.answer));
    }
    prompt
}
