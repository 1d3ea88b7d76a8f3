//! Family fan-out executor.
//!
//! Runs the seven effect families either sequentially or across a fixed-size
//! worker pool. Results are always reassembled in family submission order,
//! not completion order, so downstream conversion and logging stay
//! deterministic across runs. A panic inside a family unit is caught at the
//! unit boundary and yields an empty outcome for that family.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam_channel::unbounded;
use log::{error, info};

use crate::effects::{run_family, EffectKind, FamilyContext, FamilyOutcome};
use crate::error::AugmentError;

/// Execute every effect family for one source pair.
///
/// `num_workers <= 1` runs sequentially; otherwise one unit of work per
/// family is submitted to a pool of `num_workers` threads. Either way the
/// returned outcomes follow [`EffectKind::ALL`] order.
pub fn run_all_families(
    ctx: &FamilyContext,
    num_workers: usize,
) -> Vec<(EffectKind, FamilyOutcome)> {
    if num_workers <= 1 {
        info!("Processing effects sequentially");
        return EffectKind::ALL
            .iter()
            .map(|&kind| (kind, run_family_guarded(kind, ctx)))
            .collect();
    }

    let workers = num_workers.min(EffectKind::ALL.len());
    info!("Processing effects in parallel with {} workers", workers);

    let (job_tx, job_rx) = unbounded::<(usize, EffectKind)>();
    let (result_tx, result_rx) = unbounded::<(usize, EffectKind, FamilyOutcome)>();

    for (index, &kind) in EffectKind::ALL.iter().enumerate() {
        // Channel stays open until every job is sent
        job_tx.send((index, kind)).expect("job channel open");
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((index, kind)) = job_rx.recv() {
                    let outcome = run_family_guarded(kind, ctx);
                    if result_tx.send((index, kind, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);
    });

    let mut results: Vec<(usize, EffectKind, FamilyOutcome)> = result_rx.iter().collect();
    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, kind, outcome)| (kind, outcome))
        .collect()
}

/// Catch panics at the family-unit boundary so one family cannot take down
/// the executor (or its sibling families).
fn run_family_guarded(kind: EffectKind, ctx: &FamilyContext) -> FamilyOutcome {
    match catch_unwind(AssertUnwindSafe(|| run_family(kind, ctx))) {
        Ok(outcome) => outcome,
        Err(_) => {
            let err = AugmentError::EffectFailed {
                family: kind.name().to_string(),
                reason: "family unit panicked".to_string(),
            };
            error!("{}; yielding no variants", err);
            FamilyOutcome {
                family_error: Some(err.to_string()),
                ..FamilyOutcome::default()
            }
        }
    }
}
