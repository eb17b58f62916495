//! The launch state machine.
//!
//! A run alternates between reading the ledger, planning the next step and executing it. After
//! every step the ledger is read again and the step's post-condition decides whether the run
//! moves on, no matter what the signer reported. Nothing is persisted between runs; a new run
//! simply skips every step whose effect is already visible on chain.

use launchpad_common::{
    errors::{FailureKind, LaunchError, ReadError},
    models::{
        ChainState, PoolCreationRequest, RunContext, Step, TransactionRecord, TxHandle, TxOutcome,
    },
    planner::{plan, postcondition_holds},
    snapshot::read_chain_state,
    traits::{ChainStateReader, Signer},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, instrument, warn};

use crate::{config::OrchestratorConfig, executor::TransactionExecutor};

/// Observable state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Planning,
    AwaitingSignature { step: Step },
    AwaitingConfirmation { step: Step, tx: TxHandle },
    Verifying { step: Step, attempt: u32 },
    Completed,
    Failed { kind: FailureKind, error: String },
}

impl RunState {
    pub fn is_final(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }
}

impl From<&LaunchError> for RunState {
    fn from(error: &LaunchError) -> Self {
        RunState::Failed { kind: error.kind(), error: error.to_string() }
    }
}

/// Summary of a completed run. The records are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub final_state: RunState,
    pub records: Vec<TransactionRecord>,
}

/// What the executor produced for one step.
enum StepOutcome {
    /// The signer refused the step, no transaction exists.
    Refused(LaunchError),
    Sent(TransactionRecord),
}

impl StepOutcome {
    /// The failure to report if the step's effect turns out to be absent, `None` if the outcome
    /// is still open.
    fn failure(&self, step: &Step) -> Option<LaunchError> {
        match self {
            StepOutcome::Refused(err) => Some(err.clone()),
            StepOutcome::Sent(record) if record.outcome == TxOutcome::Reverted => {
                Some(LaunchError::Reverted {
                    step: step.kind(),
                    reason: record
                        .revert_reason
                        .clone()
                        .unwrap_or_default(),
                })
            }
            StepOutcome::Sent(_) => None,
        }
    }
}

pub struct Orchestrator<R, S> {
    reader: R,
    executor: TransactionExecutor<S>,
    ctx: RunContext,
    config: OrchestratorConfig,
    state_tx: watch::Sender<RunState>,
    records: Vec<TransactionRecord>,
}

impl<R, S> Orchestrator<R, S>
where
    R: ChainStateReader,
    S: Signer,
{
    pub fn new(
        reader: R,
        executor: TransactionExecutor<S>,
        ctx: RunContext,
        config: OrchestratorConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self { reader, executor, ctx, config, state_tx, records: Vec::new() }
    }

    /// Receiver of every state transition. Slow receivers only see the latest state.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Transaction records of the latest run, including a failed one.
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Drives `request` to completion or to the first failure.
    ///
    /// Taking `&mut self` keeps an instance single-flight. A run always starts from
    /// [`RunState::Idle`] and re-derives its progress from the ledger.
    #[instrument(skip_all, fields(token = %request.token, owner = %self.ctx.owner))]
    pub async fn run(&mut self, request: &PoolCreationRequest) -> Result<RunReport, LaunchError> {
        self.records.clear();
        self.transition(RunState::Idle);

        let result = self.drive(request).await;
        match result {
            Ok(()) => {
                info!(steps = self.records.len(), "Launch completed");
                self.transition(RunState::Completed);
                Ok(RunReport { final_state: RunState::Completed, records: self.records.clone() })
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "Launch failed");
                self.transition(RunState::from(&err));
                Err(err)
            }
        }
    }

    /// Reads the ledger once and returns the step a run would execute next.
    pub async fn preview(
        &self,
        request: &PoolCreationRequest,
    ) -> Result<Option<Step>, LaunchError> {
        self.check_request(request)?;
        let state = read_chain_state(&self.reader, request, &self.ctx).await?;
        Ok(plan(request, &state))
    }

    fn check_request(&self, request: &PoolCreationRequest) -> Result<(), LaunchError> {
        request.validate()?;
        if request.pair_asset != self.ctx.addresses.wrapped_native {
            return Err(LaunchError::InvalidRequest(format!(
                "pair asset {} is not the wrapped native asset {} of the router",
                request.pair_asset, self.ctx.addresses.wrapped_native
            )));
        }
        Ok(())
    }

    async fn drive(&mut self, request: &PoolCreationRequest) -> Result<(), LaunchError> {
        self.check_request(request)?;
        info!(
            fee_tier = request.fee_tier,
            slippage_bps = request.slippage_bps,
            recipient = %self.ctx.recipient,
            "Starting launch"
        );

        let mut steps = 0;
        loop {
            self.transition(RunState::Planning);
            let before = read_chain_state(&self.reader, request, &self.ctx).await?;

            let Some(step) = plan(request, &before) else {
                return Ok(());
            };
            if steps >= self.config.max_steps {
                return Err(LaunchError::StepBudgetExhausted { steps });
            }
            steps += 1;
            info!(%step, "Executing step");

            let mut outcome = self.execute(&step, request).await?;
            let verified = self
                .verify(&step, request, &before, &mut outcome)
                .await;
            if let StepOutcome::Sent(record) = outcome {
                self.records.push(record);
            }
            verified?;
        }
    }

    async fn execute(
        &self,
        step: &Step,
        request: &PoolCreationRequest,
    ) -> Result<StepOutcome, LaunchError> {
        self.transition(RunState::AwaitingSignature { step: step.clone() });

        let mut record = match self
            .executor
            .send(step, request, &self.ctx)
            .await
        {
            Ok(record) => record,
            // Nothing reached the signer, there is nothing to verify.
            Err(err @ LaunchError::ReadFailed(_)) => return Err(err),
            Err(err) => {
                info!(error = %err, "Step refused, checking the ledger anyway");
                return Ok(StepOutcome::Refused(err));
            }
        };

        self.transition(RunState::AwaitingConfirmation { step: step.clone(), tx: record.handle });
        self.executor
            .await_confirmation(&mut record)
            .await;
        Ok(StepOutcome::Sent(record))
    }

    /// Settles a step by reading the ledger.
    ///
    /// A refused or reverted step gets one read. A confirmed or timed out one is read up to
    /// `max_verify_attempts` times, re-polling inclusion in between, to absorb node lag.
    /// `ReadFailed` is only reported when no read succeeded and the signer gave no verdict.
    async fn verify(
        &self,
        step: &Step,
        request: &PoolCreationRequest,
        before: &ChainState,
        outcome: &mut StepOutcome,
    ) -> Result<(), LaunchError> {
        let max_attempts =
            if outcome.failure(step).is_some() { 1 } else { self.config.max_verify_attempts };
        let mut observed = false;
        let mut read_error: Option<ReadError> = None;

        for attempt in 1..=max_attempts {
            self.transition(RunState::Verifying { step: step.clone(), attempt });

            if attempt > 1 {
                sleep(self.config.verify_interval).await;
                if let StepOutcome::Sent(record) = outcome {
                    self.executor.refresh(record).await;
                }
            }

            match read_chain_state(&self.reader, request, &self.ctx).await {
                Ok(after) => {
                    observed = true;
                    if postcondition_holds(step, request, before, &after) {
                        debug!(%step, attempt, "Step effect visible on chain");
                        return Ok(());
                    }
                    if let Some(err) = outcome.failure(step) {
                        return Err(err);
                    }
                    debug!(%step, attempt, "Step effect not visible yet");
                }
                Err(err) => {
                    warn!(%step, attempt, error = %err, "Verification read failed");
                    read_error = Some(err);
                }
            }
        }

        // A definite signer failure outranks reads that could not complete.
        if let Some(err) = outcome.failure(step) {
            return Err(err);
        }
        match (observed, read_error) {
            (false, Some(err)) => Err(LaunchError::ReadFailed(err)),
            _ => Err(LaunchError::TimedOut { step: step.kind(), attempts: max_attempts }),
        }
    }

    fn transition(&self, state: RunState) {
        debug!(?state, "Run state transition");
        self.state_tx.send_replace(state);
    }
}
