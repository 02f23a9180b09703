//! A fused synchronous/asynchronous value.
//!
//! Most resolvers return ready values; scheduling a task for each of them
//! is wasted work. [`AsyncValue`] keeps the ready case synchronous and only
//! boxes a future when one is actually involved. Failures travel inside the
//! value; [`AsyncValue::rescue`] is the single mechanism by which a field is
//! isolated from its siblings.

use std::future::Future;

use futures_util::future::{try_join_all, FutureExt};

use crate::error::{ExecutionError, ExecutionResult};

type BoxFuture<T> = futures_util::future::BoxFuture<'static, ExecutionResult<T>>;

pub enum AsyncValue<T> {
    /// A synchronously known outcome.
    Ready(ExecutionResult<T>),
    /// An outcome still being computed.
    Pending(BoxFuture<T>),
}

/// A deferred field invocation, used by the sequential collection strategy.
pub type Thunk<T> = Box<dyn FnOnce() -> AsyncValue<T> + Send>;

impl<T: Send + 'static> AsyncValue<T> {
    pub fn ready(value: T) -> Self {
        AsyncValue::Ready(Ok(value))
    }

    pub fn error(error: ExecutionError) -> Self {
        AsyncValue::Ready(Err(error))
    }

    /// The empty outcome of `T` (for a response value, `null`).
    pub fn empty() -> Self
    where
        T: Default,
    {
        AsyncValue::ready(T::default())
    }

    pub fn from_result(result: ExecutionResult<T>) -> Self {
        AsyncValue::Ready(result)
    }

    pub fn from_future(future: impl Future<Output = ExecutionResult<T>> + Send + 'static) -> Self {
        AsyncValue::Pending(future.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AsyncValue::Ready(_))
    }

    /// Await the outcome.
    pub async fn get(self) -> ExecutionResult<T> {
        match self {
            AsyncValue::Ready(result) => result,
            AsyncValue::Pending(future) => future.await,
        }
    }

    pub fn map<U: Send + 'static>(self, f: impl FnOnce(T) -> U + Send + 'static) -> AsyncValue<U> {
        match self {
            AsyncValue::Ready(result) => AsyncValue::Ready(result.map(f)),
            AsyncValue::Pending(future) => {
                AsyncValue::Pending(async move { future.await.map(f) }.boxed())
            }
        }
    }

    pub fn and_then<U: Send + 'static>(
        self,
        f: impl FnOnce(T) -> AsyncValue<U> + Send + 'static,
    ) -> AsyncValue<U> {
        match self {
            AsyncValue::Ready(Ok(value)) => f(value),
            AsyncValue::Ready(Err(error)) => AsyncValue::Ready(Err(error)),
            AsyncValue::Pending(future) => {
                AsyncValue::Pending(async move { f(future.await?).get().await }.boxed())
            }
        }
    }

    /// Catch a failure and replace it with the handler's outcome. The
    /// handler may re-raise, which lets it pick which failures to absorb.
    pub fn rescue(
        self,
        f: impl FnOnce(ExecutionError) -> ExecutionResult<T> + Send + 'static,
    ) -> AsyncValue<T> {
        match self {
            AsyncValue::Ready(Ok(value)) => AsyncValue::ready(value),
            AsyncValue::Ready(Err(error)) => AsyncValue::Ready(f(error)),
            AsyncValue::Pending(future) => AsyncValue::Pending(
                async move {
                    match future.await {
                        Ok(value) => Ok(value),
                        Err(error) => f(error),
                    }
                }
                .boxed(),
            ),
        }
    }

    /// Wait for every value, preserving input order in the output.
    ///
    /// If all inputs are ready no future is created at all. A failure drops
    /// the in-flight siblings; rescued values never fail, so only fatal
    /// errors abort a collection.
    pub fn collect_parallel(values: Vec<AsyncValue<T>>) -> AsyncValue<Vec<T>> {
        if values.iter().all(AsyncValue::is_ready) {
            let collected = values
                .into_iter()
                .map(|value| match value {
                    AsyncValue::Ready(result) => result,
                    AsyncValue::Pending(_) => unreachable!(),
                })
                .collect::<ExecutionResult<Vec<_>>>();
            return AsyncValue::Ready(collected);
        }
        AsyncValue::Pending(try_join_all(values.into_iter().map(AsyncValue::get)).boxed())
    }

    /// Invoke and fully await one thunk after another, in order.
    ///
    /// The next thunk is not invoked until the previous outcome has been
    /// assembled; a failure stops the chain.
    pub fn collect_sequential(thunks: Vec<Thunk<T>>) -> AsyncValue<Vec<T>> {
        AsyncValue::Pending(
            async move {
                let mut collected = Vec::with_capacity(thunks.len());
                for thunk in thunks {
                    collected.push(thunk().get().await?);
                }
                Ok(collected)
            }
            .boxed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{error::Error, value::Name};

    #[test]
    fn ready_values_collect_without_a_runtime() {
        let collected = AsyncValue::collect_parallel(vec![
            AsyncValue::ready(1),
            AsyncValue::ready(2),
            AsyncValue::ready(3),
        ]);
        assert!(collected.is_ready());
        assert_eq!(
            futures_util::future::FutureExt::now_or_never(collected.get())
                .unwrap()
                .unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn parallel_collection_preserves_input_order() {
        let slow = AsyncValue::from_future(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok("slow")
        });
        let fast = AsyncValue::from_future(async { Ok("fast") });
        let collected = AsyncValue::collect_parallel(vec![slow, fast, AsyncValue::ready("ready")])
            .get()
            .await
            .unwrap();
        assert_eq!(collected, vec!["slow", "fast", "ready"]);
    }

    #[tokio::test]
    async fn sequential_collection_invokes_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let thunk = |n: u32| -> Thunk<u32> {
            let tx = tx.clone();
            Box::new(move || {
                tx.send(n).unwrap();
                AsyncValue::from_future(async move {
                    tokio::time::sleep(Duration::from_millis(10 * (3 - n) as u64)).await;
                    Ok(n)
                })
            })
        };
        let collected = AsyncValue::collect_sequential(vec![thunk(1), thunk(2), thunk(3)])
            .get()
            .await
            .unwrap();
        assert_eq!(collected, vec![1, 2, 3]);
        drop(tx);
        let mut invocations = Vec::new();
        while let Ok(n) = rx.try_recv() {
            invocations.push(n);
        }
        assert_eq!(invocations, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rescue_absorbs_a_failure() {
        let value: AsyncValue<i32> = AsyncValue::from_future(async {
            Err(ExecutionError::Field(Error::new("boom")))
        });
        let rescued = value.rescue(|error| match error {
            ExecutionError::Field(_) => Ok(0),
            other => Err(other),
        });
        assert_eq!(rescued.get().await.unwrap(), 0);
    }

    #[test]
    fn rescue_can_re_raise() {
        let value: AsyncValue<i32> = AsyncValue::error(ExecutionError::UnknownType {
            name: Name::new("T"),
        });
        let rescued = value.rescue(|error| match error {
            ExecutionError::Field(_) => Ok(0),
            other => Err(other),
        });
        match rescued {
            AsyncValue::Ready(Err(ExecutionError::UnknownType { name })) => {
                assert_eq!(name.as_str(), "T");
            }
            _ => panic!("expected the structural error to survive"),
        }
    }
}
