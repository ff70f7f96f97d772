//! Bounded fan-out of async work with cancellation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Run `f` over every item with at most `limit` futures in flight.
///
/// Results come back in input order. A slot is `None` when its task never
/// ran because `cancel` fired, was aborted by cancellation, or panicked.
/// Dropping the returned future aborts every outstanding task.
pub async fn map_bounded<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    cancel: &CancellationToken,
    f: F,
) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = items.len();
    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
    if total == 0 {
        return results;
    }

    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(started = index, total, "fan-out cancelled before start");
                break;
            }
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let fut = f(item);
        set.spawn(async move {
            let output = fut.await;
            drop(permit);
            (index, output)
        });
    }

    loop {
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(outstanding = set.len(), "fan-out cancelled, aborting");
                set.abort_all();
                break;
            }
            joined = set.join_next() => joined,
        };
        match joined {
            Some(Ok((index, output))) => results[index] = Some(output),
            Some(Err(e)) => tracing::warn!(error = %e, "fan-out task failed"),
            None => break,
        }
    }
    results
}
