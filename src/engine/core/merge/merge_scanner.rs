use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, trace};

use crate::engine::core::merge::{MergeInputs, MergeOptions, StepBudget};
use crate::engine::core::run::{Entry, RunCursor};
use crate::engine::core::sink::{OutputSink, SinkOptions, create_sink};
use crate::engine::errors::{MergeError, RunError};

const LOG_TARGET: &str = "merge::scanner";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePhase {
    /// Both runs still have entries.
    TwoWay,
    /// Run B is exhausted; draining run A alone.
    DrainA,
    /// Run A is exhausted; draining run B alone.
    DrainB,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    Yielded { performed: u64 },
    Completed { performed: u64, written: u64 },
}

/// Two-way streaming merge of an older run A and a newer run B.
///
/// Equal keys resolve to B's entry. With `last_level` set, tombstones are
/// dropped instead of written. Each call to `advance` is one merge action:
/// it consumes a single entry, or an A/B pair sharing a key.
pub struct MergeScanner {
    pub(crate) cursor_a: RunCursor,
    pub(crate) cursor_b: RunCursor,
    pub(crate) sink: Option<Box<dyn OutputSink>>,
    pub(crate) last_level: bool,
    pub(crate) phase: MergePhase,
    pub(crate) written: u64,
    pub(crate) actions: u64,
}

impl MergeScanner {
    /// Opens both runs and creates the output. Nothing is left behind when
    /// any of the three fails.
    pub fn open(inputs: &MergeInputs, options: &MergeOptions) -> Result<Self, MergeError> {
        let cursor_a = RunCursor::open(&inputs.run_a).map_err(MergeError::Open)?;
        let cursor_b = RunCursor::open(&inputs.run_b).map_err(MergeError::Open)?;

        let sink_options = SinkOptions {
            target_size: inputs.target_size,
            batch_bytes: options.batch_bytes,
            last_level: inputs.last_level,
        };
        let sink = create_sink(&inputs.output, &sink_options, options.sink_mode)?;

        info!(
            target: LOG_TARGET,
            run_a = %inputs.run_a.display(),
            run_b = %inputs.run_b.display(),
            output = %inputs.output.display(),
            last_level = inputs.last_level,
            sink_mode = ?options.sink_mode,
            "Merge opened"
        );

        Ok(Self {
            cursor_a,
            cursor_b,
            sink: Some(sink),
            last_level: inputs.last_level,
            phase: MergePhase::TwoWay,
            written: 0,
            actions: 0,
        })
    }

    pub fn phase(&self) -> MergePhase {
        self.phase
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Merge actions performed since the merge was opened.
    pub fn actions(&self) -> u64 {
        self.actions
    }

    /// Moves through phase transitions until the current phase has work or
    /// the merge is done. Performs no merge action.
    fn settle(&mut self) -> Result<(), MergeError> {
        loop {
            let next = match self.phase {
                MergePhase::TwoWay => {
                    let a_live = self.cursor_a.head()?.is_some();
                    let b_live = self.cursor_b.head()?.is_some();
                    match (a_live, b_live) {
                        (true, true) => return Ok(()),
                        (true, false) => MergePhase::DrainA,
                        (false, true) => MergePhase::DrainB,
                        (false, false) => MergePhase::Done,
                    }
                }
                MergePhase::DrainA => {
                    if self.cursor_a.head()?.is_some() {
                        return Ok(());
                    }
                    MergePhase::Done
                }
                MergePhase::DrainB => {
                    if self.cursor_b.head()?.is_some() {
                        return Ok(());
                    }
                    MergePhase::Done
                }
                MergePhase::Done => return Ok(()),
            };
            debug!(target: LOG_TARGET, from = ?self.phase, to = ?next, written = self.written, "Phase change");
            self.phase = next;
        }
    }

    /// Performs one merge action. Returns false, without acting, once the
    /// merge has nothing left to consume.
    pub fn advance(&mut self) -> Result<bool, MergeError> {
        self.settle()?;
        match self.phase {
            MergePhase::TwoWay => {
                let order = match (self.cursor_a.head()?, self.cursor_b.head()?) {
                    (Some(a), Some(b)) => a.key.cmp(&b.key),
                    _ => return Err(lost_head()),
                };
                match order {
                    Ordering::Less => {
                        let entry = take(&mut self.cursor_a)?;
                        self.emit(entry)?;
                    }
                    Ordering::Greater => {
                        let entry = take(&mut self.cursor_b)?;
                        self.emit(entry)?;
                    }
                    Ordering::Equal => {
                        let superseded = take(&mut self.cursor_a)?;
                        if tracing::enabled!(tracing::Level::TRACE) {
                            trace!(target: LOG_TARGET, key = ?superseded.key, "Newer run wins tie");
                        }
                        let entry = take(&mut self.cursor_b)?;
                        self.emit(entry)?;
                    }
                }
            }
            MergePhase::DrainA => {
                let entry = take(&mut self.cursor_a)?;
                self.emit(entry)?;
            }
            MergePhase::DrainB => {
                let entry = take(&mut self.cursor_b)?;
                self.emit(entry)?;
            }
            MergePhase::Done => return Ok(false),
        }
        self.actions += 1;
        Ok(true)
    }

    fn emit(&mut self, entry: Entry) -> Result<(), MergeError> {
        if self.last_level && entry.is_tombstone() {
            if tracing::enabled!(tracing::Level::TRACE) {
                trace!(target: LOG_TARGET, key = ?entry.key, "Dropping tombstone at last level");
            }
            return Ok(());
        }
        let sink = self.sink.as_mut().ok_or(MergeError::Closed)?;
        sink.append(entry)?;
        self.written += 1;
        Ok(())
    }

    /// Runs actions until the budget is spent or the merge completes. A
    /// completed merge has its output finalized before this returns.
    pub fn run_burst(&mut self, budget: &mut StepBudget) -> Result<BurstOutcome, MergeError> {
        let mut performed = 0;
        while !budget.is_exhausted() {
            if !self.advance()? {
                break;
            }
            budget.charge();
            performed += 1;
        }

        self.settle()?;
        if self.phase == MergePhase::Done {
            let written = self.finish()?;
            return Ok(BurstOutcome::Completed { performed, written });
        }

        debug!(target: LOG_TARGET, performed, written = self.written, phase = ?self.phase, "Burst yielded");
        Ok(BurstOutcome::Yielded { performed })
    }

    pub fn run_to_completion(&mut self) -> Result<u64, MergeError> {
        match self.run_burst(&mut StepBudget::unlimited())? {
            BurstOutcome::Completed { written, .. } => Ok(written),
            BurstOutcome::Yielded { .. } => Err(MergeError::Task(
                "unlimited burst yielded before completion".to_string(),
            )),
        }
    }

    fn finish(&mut self) -> Result<u64, MergeError> {
        let sink = self.sink.take().ok_or(MergeError::Closed)?;
        let count = sink.finalize()?;
        info!(target: LOG_TARGET, written = count, actions = self.actions, "Merge completed");
        Ok(count)
    }
}

fn take(cursor: &mut RunCursor) -> Result<Entry, MergeError> {
    cursor.next()?.ok_or_else(lost_head)
}

fn lost_head() -> MergeError {
    MergeError::Run(RunError::Corrupt(
        "cursor lost its head entry between peek and read".to_string(),
    ))
}
