//! FnBody - クロージャ 3 つで LoopBody を組み立てる
//!
//! trait を実装するほどでもない小さなループ（テスト、単純なポーリング）向け。

use async_trait::async_trait;

use crate::error::Fault;
use crate::ports::LoopBody;

type SetupFn = Box<dyn FnMut() -> bool + Send>;
type StepFn<T> = Box<dyn FnMut() -> Result<T, Fault> + Send>;
type ErrorFn = Box<dyn FnMut(Fault) -> Result<(), Fault> + Send>;

/// A [`LoopBody`] made of three function-valued fields.
///
/// Defaults: `setup` succeeds, `handle_error` escalates every fault.
///
/// # 使用例
/// ```ignore
/// let body = FnBody::new(|| read_sensor())
///     .with_setup(|| sensor_present())
///     .with_error_handler(|fault| if is_glitch(&fault) { Ok(()) } else { Err(fault) });
/// ```
pub struct FnBody<T> {
    setup: SetupFn,
    step: StepFn<T>,
    handle_error: ErrorFn,
}

impl<T: Send + 'static> FnBody<T> {
    pub fn new<S>(step: S) -> Self
    where
        S: FnMut() -> Result<T, Fault> + Send + 'static,
    {
        Self {
            setup: Box::new(|| true),
            step: Box::new(step),
            handle_error: Box::new(Err::<(), Fault>),
        }
    }

    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.setup = Box::new(setup);
        self
    }

    pub fn with_error_handler<F>(mut self, handle_error: F) -> Self
    where
        F: FnMut(Fault) -> Result<(), Fault> + Send + 'static,
    {
        self.handle_error = Box::new(handle_error);
        self
    }
}

#[async_trait]
impl<T: Send + 'static> LoopBody for FnBody<T> {
    type Item = T;

    async fn setup(&mut self) -> bool {
        (self.setup)()
    }

    async fn step(&mut self) -> Result<T, Fault> {
        (self.step)()
    }

    async fn handle_error(&mut self, fault: Fault) -> Result<(), Fault> {
        (self.handle_error)(fault)
    }
}
