//! Ordered mutation with compensation.
//!
//! The document store has no multi-document transactions. A [`Saga`] is an ordered
//! list of steps, each a forward action paired with an optional compensation. Steps
//! run in order; after each success its compensation is pushed onto a stack. When a
//! step fails the stack is unwound in reverse and every compensation is attempted,
//! even if an earlier one failed.
//!
//! ```ignore
//! Saga::new("top_up")
//!     .step_with_compensation(
//!         "create_intent",
//!         || async { store.set(&intent_path, intent).await },
//!         || async { store.delete(&intent_path).await },
//!     )
//!     .step("credit_balance", || async { ledger.credit(&account, amount).await })
//!     .run()
//!     .await?;
//! ```

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

type Action<'a, E> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), E>> + Send + 'a>;

struct Step<'a, E> {
    name: &'static str,
    forward: Action<'a, E>,
    compensation: Option<Action<'a, E>>,
}

/// A sequence of compensable steps.
pub struct Saga<'a, E> {
    name: &'static str,
    steps: Vec<Step<'a, E>>,
}

impl<'a, E> Saga<'a, E>
where
    E: fmt::Display + Send + 'a,
{
    /// Start an empty saga.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Append a step with nothing to undo.
    #[must_use]
    pub fn step<F, Fut>(mut self, name: &'static str, forward: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.steps.push(Step {
            name,
            forward: boxed(forward),
            compensation: None,
        });
        self
    }

    /// Append a step whose effect is undone by `compensate` if a later step fails.
    #[must_use]
    pub fn step_with_compensation<F, Fut, C, CFut>(
        mut self,
        name: &'static str,
        forward: F,
        compensate: C,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
        C: FnOnce() -> CFut + Send + 'a,
        CFut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.steps.push(Step {
            name,
            forward: boxed(forward),
            compensation: Some(boxed(compensate)),
        });
        self
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the saga has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, unwinding on the first failure.
    ///
    /// # Errors
    ///
    /// Returns a [`SagaFailure`] naming the failed step, its error, and any
    /// compensations that failed while unwinding.
    pub async fn run(self) -> Result<(), SagaFailure<E>> {
        let Self { name: saga, steps } = self;
        let mut undo: Vec<(&'static str, Action<'a, E>)> = Vec::with_capacity(steps.len());

        for step in steps {
            match (step.forward)().await {
                Ok(()) => {
                    tracing::debug!(saga, step = step.name, "Saga step completed");
                    if let Some(compensation) = step.compensation {
                        undo.push((step.name, compensation));
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        saga,
                        step = step.name,
                        error = %error,
                        pending_compensations = undo.len(),
                        "Saga step failed, compensating"
                    );
                    let compensation_failures = unwind(saga, undo).await;
                    return Err(SagaFailure {
                        saga,
                        step: step.name,
                        error,
                        compensation_failures,
                    });
                }
            }
        }

        Ok(())
    }
}

fn boxed<'a, E, F, Fut>(action: F) -> Action<'a, E>
where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = Result<(), E>> + Send + 'a,
{
    Box::new(move || action().boxed())
}

async fn unwind<'a, E: fmt::Display>(
    saga: &'static str,
    mut undo: Vec<(&'static str, Action<'a, E>)>,
) -> Vec<CompensationFailure<E>> {
    let mut failures = Vec::new();

    while let Some((step, compensation)) = undo.pop() {
        match compensation().await {
            Ok(()) => tracing::info!(saga, step, "Compensated saga step"),
            Err(error) => {
                tracing::error!(
                    saga,
                    step,
                    error = %error,
                    "Compensation failed - manual repair required"
                );
                failures.push(CompensationFailure { step, error });
            }
        }
    }

    failures
}

/// A compensation that could not be applied.
#[derive(Debug)]
pub struct CompensationFailure<E> {
    /// Step whose effect is still in place.
    pub step: &'static str,
    /// Why the compensation failed.
    pub error: E,
}

/// Outcome of a failed saga.
#[derive(Debug)]
pub struct SagaFailure<E> {
    /// Saga name.
    pub saga: &'static str,
    /// The step that failed.
    pub step: &'static str,
    /// The step's error.
    pub error: E,
    /// Compensations that failed while unwinding. Empty when fully rolled back.
    pub compensation_failures: Vec<CompensationFailure<E>>,
}

impl<E> SagaFailure<E> {
    /// Whether every completed step was rolled back.
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        self.compensation_failures.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for SagaFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "saga {} failed at {}: {}", self.saga, self.step, self.error)?;
        if !self.is_rolled_back() {
            write!(
                f,
                " ({} compensation(s) failed)",
                self.compensation_failures.len()
            )?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for SagaFailure<E> {}
