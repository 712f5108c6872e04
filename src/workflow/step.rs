use std::fmt;
use std::future::Future;

use crate::error::AppResult;

/// What a single triage step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
    Ok(T),
    /// The step could not do its job but substituted a safe value.
    Degraded { value: T, reason: String },
    /// Re-running the step cannot help; the run stops here.
    NonRetriable(String),
}

impl<T> StepOutcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        StepOutcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn map<U, F>(self, f: F) -> StepOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            StepOutcome::Ok(value) => StepOutcome::Ok(f(value)),
            StepOutcome::Degraded { value, reason } => StepOutcome::Degraded {
                value: f(value),
                reason,
            },
            StepOutcome::NonRetriable(reason) => StepOutcome::NonRetriable(reason),
        }
    }
}

/// Why a triage run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: &'static str,
    pub reason: String,
    pub retriable: bool,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.retriable {
            "retriable"
        } else {
            "non-retriable"
        };
        write!(f, "step '{}' failed ({kind}): {}", self.step, self.reason)
    }
}

/// Runs one named step and folds its outcome into a plain value or a failure.
pub async fn run_step<T, F>(step: &'static str, future: F) -> Result<T, StepFailure>
where
    F: Future<Output = AppResult<StepOutcome<T>>>,
{
    tracing::debug!(step, "step started");
    match future.await {
        Ok(StepOutcome::Ok(value)) => {
            tracing::debug!(step, "step completed");
            Ok(value)
        }
        Ok(StepOutcome::Degraded { value, reason }) => {
            tracing::warn!(step, %reason, "step degraded");
            Ok(value)
        }
        Ok(StepOutcome::NonRetriable(reason)) => {
            tracing::error!(step, %reason, "step failed permanently");
            Err(StepFailure {
                step,
                reason,
                retriable: false,
            })
        }
        Err(err) => {
            let retriable = err.is_retriable();
            tracing::error!(step, error = %err, retriable, "step failed");
            Err(StepFailure {
                step,
                reason: err.to_string(),
                retriable,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn degraded_steps_yield_their_fallback() {
        let value = run_step("analyze", async {
            Ok(StepOutcome::degraded(7, "model offline"))
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn classifies_failures() {
        let failure = run_step::<(), _>("fetch", async {
            Ok(StepOutcome::NonRetriable("ticket not found".to_string()))
        })
        .await
        .unwrap_err();
        assert!(!failure.retriable);
        assert_eq!(failure.step, "fetch");

        let failure = run_step::<(), _>("assign", async {
            Err(AppError::UserStore("disk full".to_string()))
        })
        .await
        .unwrap_err();
        assert!(failure.retriable);
        assert!(failure.to_string().contains("disk full"));
    }
}
