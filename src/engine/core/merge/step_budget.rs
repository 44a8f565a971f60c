/// Correlation token echoed back in the `StepDone` of the burst it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepToken(pub u64);

/// Countdown of merge actions the scanner may perform before yielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    pub remaining: u64,
    pub token: Option<StepToken>,
}

impl StepBudget {
    pub fn new(count: u64, token: Option<StepToken>) -> Self {
        Self {
            remaining: count,
            token,
        }
    }

    /// Budget that never runs out; used for single-shot merges.
    pub fn unlimited() -> Self {
        Self::new(u64::MAX, None)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Charges one action. Returns false when nothing was left to charge.
    pub fn charge(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Budget used up; the merge waits for the next grant.
    Yielded,
    Completed { written: u64 },
}

/// Acknowledgement of one granted burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDone {
    pub token: StepToken,
    pub performed: u64,
    pub status: StepStatus,
    /// Times the merge has hibernated so far.
    pub hibernations: u32,
}

impl StepDone {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, StepStatus::Completed { .. })
    }
}
