//! Submission of single steps and the wait for their inclusion.
//!
//! The executor never decides whether a step took effect. It reports what the signer said, and
//! the orchestrator settles the question with a fresh ledger read.

use std::time::Duration;

use chrono::Utc;
use launchpad_common::{
    errors::{classify_signer_error, LaunchError, SignerError},
    models::{PoolCreationRequest, RunContext, Step, TransactionRecord, TxHandle, TxOutcome},
    traits::{Inclusion, Signer},
};
use launchpad_ethereum::contracts::encode_step;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::OrchestratorConfig;

pub struct TransactionExecutor<S> {
    signer: S,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl<S: Signer> TransactionExecutor<S> {
    pub fn new(signer: S, poll_interval: Duration, confirmation_timeout: Duration) -> Self {
        Self { signer, poll_interval, confirmation_timeout }
    }

    pub fn from_config(signer: S, config: &OrchestratorConfig) -> Self {
        Self::new(signer, config.poll_interval, config.confirmation_timeout)
    }

    /// Encodes `step` and hands it to the signer. Waits as long as the account holder takes.
    ///
    /// Returns a pending record on success. A signer failure is classified right away, since no
    /// transaction exists yet.
    #[instrument(level = "debug", skip_all, fields(step = %step.kind()))]
    pub async fn send(
        &self,
        step: &Step,
        request: &PoolCreationRequest,
        ctx: &RunContext,
    ) -> Result<TransactionRecord, LaunchError> {
        let intent = encode_step(step, request, ctx);
        debug!(to = %intent.to, value = %intent.value, "Requesting signature");

        let handle = self
            .signer
            .submit(&intent)
            .await
            .map_err(|e| classify_signer_error(step.kind(), e))?;

        info!(%handle, "Step submitted");
        Ok(TransactionRecord::pending(step.clone(), handle, Utc::now()))
    }

    /// Polls the signer until the transaction is included or `confirmation_timeout` elapses.
    ///
    /// Failed polls are logged and retried within the same time bound. The outcome is stored on
    /// `record`.
    #[instrument(level = "debug", skip_all, fields(handle = %record.handle))]
    pub async fn await_confirmation(&self, record: &mut TransactionRecord) {
        let deadline = Instant::now() + self.confirmation_timeout;

        loop {
            match self.signer.wait_for_inclusion(&record.handle).await {
                Ok(Inclusion::Confirmed { block_number }) => {
                    info!(block_number, "Transaction confirmed");
                    record.confirm(Utc::now());
                    return;
                }
                Ok(Inclusion::Reverted { reason }) => {
                    warn!(%reason, "Transaction reverted");
                    record.revert(reason);
                    return;
                }
                Ok(Inclusion::Pending) => {}
                Err(err) => warn!(error = %err, "Failed to poll transaction inclusion"),
            }

            if Instant::now() + self.poll_interval > deadline {
                warn!(timeout = ?self.confirmation_timeout, "Transaction not included in time");
                record.time_out();
                return;
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Sends `step` and waits for its inclusion.
    pub async fn submit(
        &self,
        step: &Step,
        request: &PoolCreationRequest,
        ctx: &RunContext,
    ) -> Result<TransactionRecord, LaunchError> {
        let mut record = self.send(step, request, ctx).await?;
        self.await_confirmation(&mut record).await;
        Ok(record)
    }

    /// One more inclusion poll for a transaction whose confirmation wait timed out.
    pub async fn recheck(&self, handle: &TxHandle) -> Result<Inclusion, SignerError> {
        self.signer
            .wait_for_inclusion(handle)
            .await
    }

    /// Applies a late inclusion result to `record`. Only records still lacking an outcome change.
    pub async fn refresh(&self, record: &mut TransactionRecord) {
        if !matches!(record.outcome, TxOutcome::TimedOut | TxOutcome::Pending) {
            return;
        }

        match self.recheck(&record.handle).await {
            Ok(Inclusion::Confirmed { block_number }) => {
                info!(handle = %record.handle, block_number, "Transaction confirmed late");
                record.confirm(Utc::now());
            }
            Ok(Inclusion::Reverted { reason }) => {
                warn!(handle = %record.handle, %reason, "Transaction reverted late");
                record.revert(reason);
            }
            Ok(Inclusion::Pending) => debug!(handle = %record.handle, "Still not included"),
            Err(err) => {
                warn!(handle = %record.handle, error = %err, "Failed to re-poll inclusion")
            }
        }
    }
}
