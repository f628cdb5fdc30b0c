//! Record sink trait for streaming consumption.

use async_trait::async_trait;
use cf_error::SinkError;
use cf_types::InputId;

/// Consumer of reassembled records.
///
/// The reassembler calls [`write`](RecordSink::write) exactly once per
/// `(input, chunk_index)`, in strictly increasing chunk order per input, and
/// never concurrently: a sink is driven by a single loop.
#[async_trait]
pub trait RecordSink<T: Send + 'static>: Send {
    /// Consume the records of the next chunk of `input`.
    async fn write(&mut self, input: &InputId, records: Vec<T>) -> Result<(), SinkError>;

    /// Flush buffered output. Called once after the last write of a
    /// successful run.
    async fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl<T, S> RecordSink<T> for &mut S
where
    T: Send + 'static,
    S: RecordSink<T> + ?Sized,
{
    async fn write(&mut self, input: &InputId, records: Vec<T>) -> Result<(), SinkError> {
        (**self).write(input, records).await
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish().await
    }
}

/// A [`RecordSink`] backed by a synchronous closure.
///
/// Created by [`sink_fn`].
pub struct FnSink<F> {
    f: F,
}

/// Build a sink from a closure.
///
/// ```
/// use cf_traits::{sink_fn, RecordSink};
/// use cf_types::InputId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut seen = Vec::new();
/// let mut sink = sink_fn(|_input: &InputId, records: Vec<u32>| {
///     seen.extend(records);
///     Ok(())
/// });
/// sink.write(&InputId::from("a"), vec![1, 2]).await.unwrap();
/// drop(sink);
/// assert_eq!(seen, vec![1, 2]);
/// # });
/// ```
pub fn sink_fn<T, F>(f: F) -> FnSink<F>
where
    T: Send + 'static,
    F: FnMut(&InputId, Vec<T>) -> Result<(), SinkError> + Send,
{
    FnSink { f }
}

#[async_trait]
impl<T, F> RecordSink<T> for FnSink<F>
where
    T: Send + 'static,
    F: FnMut(&InputId, Vec<T>) -> Result<(), SinkError> + Send,
{
    async fn write(&mut self, input: &InputId, records: Vec<T>) -> Result<(), SinkError> {
        (self.f)(input, records)
    }
}
