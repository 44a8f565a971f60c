use std::path::Path;
use tracing::info;

use crate::engine::core::merge::{MergeInputs, MergeOptions, MergeScanner};
use crate::engine::errors::MergeError;

/// Merges `run_a` (older) with `run_b` (newer) into `output` in one call,
/// without throttling. Returns the number of entries written.
///
/// On error the output file, if created, is not a valid run and must be
/// discarded by the caller.
pub fn merge(
    run_a: &Path,
    run_b: &Path,
    output: &Path,
    target_size: u64,
    is_last_level: bool,
    options: &MergeOptions,
) -> Result<u64, MergeError> {
    let inputs = MergeInputs::new(run_a, run_b, output)
        .with_target_size(target_size)
        .with_last_level(is_last_level);

    let mut scanner = MergeScanner::open(&inputs, options)?;
    let written = scanner.run_to_completion()?;
    info!(target: "merge::runner", output = %output.display(), written, "Single-shot merge finished");
    Ok(written)
}
