//! LoopBody port - ループ本体の抽象化
//!
//! 継承の代わりに capability trait で setup / step / handle_error を注入します。
//! クロージャで済ませたい場合は `impls::FnBody` を使います。

use async_trait::async_trait;

use super::Consumer;
use crate::error::Fault;

/// The unit of work a `WorkerLoop` runs.
///
/// All methods except `setup` run on the loop's own task and are strictly
/// sequenced: never two at once.
///
/// # 使用例
/// ```ignore
/// struct Poller { sensor: Sensor }
///
/// #[async_trait]
/// impl LoopBody for Poller {
///     type Item = Reading;
///
///     async fn setup(&mut self) -> bool {
///         self.sensor.connect().await.is_ok()
///     }
///
///     async fn step(&mut self) -> Result<Reading, Fault> {
///         Ok(self.sensor.read().await?)
///     }
///
///     async fn handle_error(&mut self, fault: Fault) -> Result<(), Fault> {
///         if fault.is::<Glitch>() { Ok(()) } else { Err(fault) }
///     }
/// }
/// ```
///
/// # Cancellation
/// A stop request is only observed between iterations. Keep `step` bounded
/// in duration; a step that never returns cannot be stopped.
#[async_trait]
pub trait LoopBody: Send + 'static {
    type Item: Send + 'static;

    /// Runs on the caller's task inside `start`. `false` fails the start
    /// and the loop never runs.
    async fn setup(&mut self) -> bool;

    /// One unit of work. The result is queued for the consumer.
    async fn step(&mut self) -> Result<Self::Item, Fault>;

    /// Classify a fault from `step`.
    ///
    /// `Ok(())` means recovered, keep looping. `Err(fault)` (the original or
    /// a derived one) terminates the run routine and is reported at `join`.
    async fn handle_error(&mut self, fault: Fault) -> Result<(), Fault>;

    /// Hand one drained item to the consumer.
    ///
    /// Override to add pre/post behaviour, but the item must still reach
    /// `consumer`. Faults returned here are fatal and bypass `handle_error`.
    fn consume(
        &mut self,
        item: Self::Item,
        consumer: &mut Consumer<Self::Item>,
    ) -> Result<(), Fault> {
        consumer.deliver(item)
    }
}
