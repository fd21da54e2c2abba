//! Bounded fan-out inside a single check.
//!
//! Each check receives a private concurrency budget from the executor and
//! uses [`fan_out`] to issue its per-resource sub-requests within it. Outputs
//! land in a slot array pre-sized to the input, indexed by input position, so
//! concurrent completions never contend on a shared lock.

use std::future::Future;

use audit::{CheckError, ErrorClassifier};
use futures::stream::{self, StreamExt};

/// Runs `f` over every item with at most `concurrency` futures in flight.
///
/// `f` receives the item's input position alongside the item. Outputs are
/// returned in input order regardless of completion order. A budget of `0`
/// is treated as `1`.
pub async fn fan_out<I, T, F, Fut>(items: Vec<I>, concurrency: usize, f: F) -> Vec<T>
where
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = T>,
{
    let total = items.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completed = std::pin::pin!(stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let pending = f(index, item);
            async move { (index, pending.await) }
        })
        .buffer_unordered(concurrency.max(1)));

    let mut done = 0usize;
    while let Some((index, output)) = completed.next().await {
        slots[index] = Some(output);
        done += 1;
        tracing::debug!(completed = done, total, "Fan-out progress");
    }

    slots.into_iter().flatten().collect()
}

/// Separates fan-out outputs into values and the root-cause failure.
///
/// Failures the classifier lets the check continue past are dropped along
/// with the item that produced them. The first remaining failure, in input
/// order, is returned as the error.
pub fn collect_outputs<T>(
    classifier: &dyn ErrorClassifier,
    outputs: Vec<Result<T, CheckError>>,
) -> Result<Vec<T>, CheckError> {
    let mut values = Vec::with_capacity(outputs.len());
    for output in outputs {
        match output {
            Ok(value) => values.push(value),
            Err(err) if classifier.should_continue(&err) => {
                tracing::debug!(error = %err, "Skipping resource after permission error");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(values)
}
