//! Bounded validate → auto-fix → re-validate loop.

use std::path::Path;

use super::phase::{PhaseRunner, PhaseSpec, ProgressBand};
use crate::agent::ToolGrant;
use crate::errors::WorkflowError;
use crate::prompts::validation::{fix_prompt, validation_prompt};
use crate::signals::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Validating { attempt: u32 },
    AutoFixing { attempt: u32 },
    /// `soft` when the report carried no verdict at all.
    Passed { attempt: u32, soft: bool },
    HardFailed { attempt: u32 },
}

/// State after a validation run of `attempt` produced `verdict`.
pub fn after_validation(attempt: u32, verdict: Option<Verdict>, max_attempts: u32) -> ValidationState {
    match verdict {
        Some(Verdict::Ready) => ValidationState::Passed {
            attempt,
            soft: false,
        },
        None => ValidationState::Passed {
            attempt,
            soft: true,
        },
        Some(Verdict::Critical) if attempt < max_attempts => ValidationState::AutoFixing { attempt },
        Some(Verdict::Critical) => ValidationState::HardFailed { attempt },
    }
}

/// State after the auto-fix of `attempt` finished.
pub fn after_fix(attempt: u32) -> ValidationState {
    ValidationState::Validating {
        attempt: attempt + 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub validations: u32,
    pub fixes: u32,
    pub soft: bool,
}

pub struct ValidationLoop {
    max_attempts: u32,
    band: ProgressBand,
}

impl ValidationLoop {
    pub fn new(max_attempts: u32, band: ProgressBand) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            band,
        }
    }

    /// Each attempt owns an equal slice of the band: validation in its first
    /// half, auto-fix in its second half.
    fn attempt_band(&self, attempt: u32, fixing: bool) -> ProgressBand {
        let index = (attempt - 1) * 2 + u32::from(fixing);
        self.band.split(self.max_attempts * 2, index)
    }

    pub async fn run(
        &self,
        runner: &PhaseRunner<'_>,
        site_dir: &Path,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let mut state = ValidationState::Validating { attempt: 1 };
        let mut report = String::new();
        let mut fixes = 0;

        loop {
            state = match state {
                ValidationState::Validating { attempt } => {
                    let spec = PhaseSpec::new(
                        format!("Validation (attempt {}/{})", attempt, self.max_attempts),
                        validation_prompt(site_dir, attempt, self.max_attempts),
                        ToolGrant::Validation,
                        self.attempt_band(attempt, false),
                    );
                    let result = runner.run(spec).await?;
                    report = result.report;
                    let next = after_validation(attempt, result.signals.verdict, self.max_attempts);
                    tracing::info!(
                        job_id = runner.job_id(),
                        attempt,
                        verdict = ?result.signals.verdict,
                        next = ?next,
                        "validation classified"
                    );
                    next
                }
                ValidationState::AutoFixing { attempt } => {
                    let spec = PhaseSpec::new(
                        format!("Auto-fix (attempt {})", attempt),
                        fix_prompt(site_dir, &report, attempt),
                        ToolGrant::Generation,
                        self.attempt_band(attempt, true),
                    );
                    runner.run(spec).await?;
                    fixes += 1;
                    after_fix(attempt)
                }
                ValidationState::Passed { attempt, soft } => {
                    if soft {
                        tracing::warn!(
                            job_id = runner.job_id(),
                            attempt,
                            "validation report carried no verdict; continuing"
                        );
                        runner.advance(self.band.end, "Validation completed with warnings");
                    } else {
                        runner.advance(self.band.end, "Validation passed - site is production-ready");
                    }
                    return Ok(ValidationOutcome {
                        validations: attempt,
                        fixes,
                        soft,
                    });
                }
                ValidationState::HardFailed { attempt } => {
                    return Err(WorkflowError::ValidationExhausted {
                        attempts: attempt,
                        report,
                    });
                }
            };
        }
    }
}
