//! Consumer capability: where drained items go.

use std::fmt;

use crate::error::Fault;

type Sink<T> = Box<dyn FnMut(T) -> Result<(), Fault> + Send>;

/// Receives every item a loop produces, one at a time, in FIFO order.
///
/// There is no silent consumer: the default (`Consumer::trace`) logs each
/// item through `tracing`.
pub struct Consumer<T> {
    sink: Sink<T>,
    kind: &'static str,
}

impl<T: 'static> Consumer<T> {
    /// A consumer that may fault. A fault is fatal to the run routine.
    pub fn new<F>(sink: F) -> Self
    where
        F: FnMut(T) -> Result<(), Fault> + Send + 'static,
    {
        Self {
            sink: Box::new(sink),
            kind: "custom",
        }
    }

    /// A consumer that cannot fault.
    pub fn infallible<F>(mut sink: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::new(move |item| {
            sink(item);
            Ok(())
        })
    }

    /// The default sink: log every item at `info` on target `shuttle::consume`.
    pub fn trace() -> Self
    where
        T: fmt::Debug,
    {
        Self {
            sink: Box::new(|item: T| -> Result<(), Fault> {
                tracing::info!(target: "shuttle::consume", item = ?item, "item consumed");
                Ok(())
            }),
            kind: "trace",
        }
    }

    pub fn deliver(&mut self, item: T) -> Result<(), Fault> {
        (self.sink)(item)
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("kind", &self.kind).finish()
    }
}
