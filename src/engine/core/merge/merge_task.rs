use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::engine::core::merge::{
    BurstOutcome, HibernatedMerge, MergeInputs, MergeOptions, MergeScanner, StepBudget, StepDone,
    StepStatus, StepToken,
};
use crate::engine::errors::MergeError;

const LOG_TARGET: &str = "merge::task";

struct StepRequest {
    budget: StepBudget,
    reply: Option<oneshot::Sender<StepDone>>,
}

enum MergeSlot {
    Live(MergeScanner),
    Hibernated(HibernatedMerge),
}

/// Driver-side handle of a merge running in its own task.
///
/// Dropping every handle abandons the merge: the task releases its state
/// and ends with `MergeError::Abandoned`. The partial output stays on disk.
pub struct MergeHandle {
    tx: mpsc::Sender<StepRequest>,
    pub(crate) task: Option<JoinHandle<Result<u64, MergeError>>>,
    next_token: u64,
}

/// Opens the merge and moves it into a tokio task that waits for step
/// grants. Open failures are returned here, before any task exists.
pub fn spawn_merge(inputs: MergeInputs, options: MergeOptions) -> Result<MergeHandle, MergeError> {
    let scanner = MergeScanner::open(&inputs, &options)?;
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(run_merge_task(scanner, rx, options.idle_hibernate));
    Ok(MergeHandle {
        tx,
        task: Some(task),
        next_token: 0,
    })
}

impl MergeHandle {
    pub fn next_token(&mut self) -> StepToken {
        self.next_token += 1;
        StepToken(self.next_token)
    }

    /// Grants `count` merge actions and waits for the burst's `StepDone`.
    /// A zero `count` is answered at once with `performed = 0`.
    pub async fn step(&mut self, token: StepToken, count: u64) -> Result<StepDone, MergeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = StepRequest {
            budget: StepBudget::new(count, Some(token)),
            reply: Some(reply_tx),
        };
        if self.tx.send(request).await.is_err() {
            return Err(self.task_outcome_error().await);
        }
        match reply_rx.await {
            Ok(done) => Ok(done),
            Err(_) => Err(self.task_outcome_error().await),
        }
    }

    /// Grants `count` merge actions without asking for an acknowledgement.
    pub async fn grant(&mut self, count: u64) -> Result<(), MergeError> {
        let request = StepRequest {
            budget: StepBudget::new(count, None),
            reply: None,
        };
        if self.tx.send(request).await.is_err() {
            return Err(self.task_outcome_error().await);
        }
        Ok(())
    }

    /// Keeps granting bursts of `burst` actions until the merge completes.
    pub async fn run_to_completion(mut self, burst: u64) -> Result<u64, MergeError> {
        loop {
            let token = self.next_token();
            let done = self.step(token, burst.max(1)).await?;
            if let StepStatus::Completed { written } = done.status {
                self.join().await?;
                return Ok(written);
            }
        }
    }

    /// Waits for the merge task to end and returns its final written count.
    pub async fn join(mut self) -> Result<u64, MergeError> {
        match self.task.take() {
            Some(task) => task.await.map_err(|e| MergeError::Task(e.to_string()))?,
            None => Err(MergeError::Closed),
        }
    }

    /// Called once the task stopped answering: surfaces the error it ended with.
    async fn task_outcome_error(&mut self) -> MergeError {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(Err(e)) => e,
                Ok(Ok(_)) => MergeError::Closed,
                Err(e) => MergeError::Task(e.to_string()),
            },
            None => MergeError::Closed,
        }
    }
}

async fn run_merge_task(
    scanner: MergeScanner,
    rx: mpsc::Receiver<StepRequest>,
    idle: Duration,
) -> Result<u64, MergeError> {
    let result = drive_merge(scanner, rx, idle).await;
    match &result {
        Err(MergeError::Abandoned) | Ok(_) => {}
        Err(e) => e.log_error(),
    }
    result
}

async fn drive_merge(
    scanner: MergeScanner,
    mut rx: mpsc::Receiver<StepRequest>,
    idle: Duration,
) -> Result<u64, MergeError> {
    let mut slot = MergeSlot::Live(scanner);
    let mut hibernations = 0u32;

    loop {
        let live = matches!(slot, MergeSlot::Live(_));
        let request = if live {
            match timeout(idle, rx.recv()).await {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(_) => {
                    slot = hibernate(slot).await?;
                    hibernations += 1;
                    continue;
                }
            }
        } else {
            match rx.recv().await {
                Some(request) => request,
                None => break,
            }
        };

        let scanner = match slot {
            MergeSlot::Live(scanner) => scanner,
            MergeSlot::Hibernated(hibernated) => {
                tokio::task::spawn_blocking(move || hibernated.restore())
                    .await
                    .map_err(|e| MergeError::Task(e.to_string()))??
            }
        };

        let StepRequest { mut budget, reply } = request;
        let token = budget.token;
        debug!(target: LOG_TARGET, granted = budget.remaining, token = ?token, "Step granted");

        let (scanner, outcome) = tokio::task::spawn_blocking(move || {
            let mut scanner = scanner;
            let outcome = scanner.run_burst(&mut budget);
            (scanner, outcome)
        })
        .await
        .map_err(|e| MergeError::Task(e.to_string()))?;

        match outcome? {
            BurstOutcome::Yielded { performed } => {
                notify(reply, token, performed, StepStatus::Yielded, hibernations);
                slot = MergeSlot::Live(scanner);
            }
            BurstOutcome::Completed { performed, written } => {
                notify(
                    reply,
                    token,
                    performed,
                    StepStatus::Completed { written },
                    hibernations,
                );
                return Ok(written);
            }
        }
    }

    warn!(target: LOG_TARGET, hibernations, "All merge handles dropped, abandoning merge");
    drop(slot);
    Err(MergeError::Abandoned)
}

async fn hibernate(slot: MergeSlot) -> Result<MergeSlot, MergeError> {
    match slot {
        MergeSlot::Live(scanner) => {
            let hibernated = tokio::task::spawn_blocking(move || HibernatedMerge::capture(scanner))
                .await
                .map_err(|e| MergeError::Task(e.to_string()))??;
            Ok(MergeSlot::Hibernated(hibernated))
        }
        hibernated => Ok(hibernated),
    }
}

fn notify(
    reply: Option<oneshot::Sender<StepDone>>,
    token: Option<StepToken>,
    performed: u64,
    status: StepStatus,
    hibernations: u32,
) {
    let (Some(reply), Some(token)) = (reply, token) else {
        return;
    };
    let done = StepDone {
        token,
        performed,
        status,
        hibernations,
    };
    if reply.send(done).is_err() {
        info!(target: LOG_TARGET, token = ?token, "Step requester went away before step_done");
    }
}
