//! Drives one run of the step-wise interactive protocol
//!
//! The driver owns none of the protocol's rules. It feeds one answer set
//! per step, filtered to the fields the step's schema declares, until the
//! run reaches a terminal outcome or a classified failure. Any failure that
//! leaves the run in progress is followed by a best-effort abort so no
//! half-finished interactive session leaks into the subsystem.

use crate::error::{FlowError, FlowResult};
use crate::protocol::{FlowContext, FlowProtocol, FlowSubject, ProtocolError};
use lockstep_types::{AnswerMap, FlowReceipt, FlowRunId, FlowStep, FormStep};
use tracing::{debug, warn};

/// Abort reason the protocol uses when an equivalent entry already exists.
pub const REASON_ALREADY_CONFIGURED: &str = "already_configured";

/// Runs interactive flows to completion on behalf of managed entries.
#[derive(Debug, Clone)]
pub struct FlowDriver {
    context: FlowContext,
}

/// What a step means for the driver's loop: keep answering, or done.
enum Inspected {
    Form(FormStep),
    Done(FlowReceipt),
}

impl FlowDriver {
    pub fn new(context: FlowContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    /// Run one flow for `subject`, supplying one answer set per step.
    ///
    /// Unused trailing answer sets are not an error: a flow may finish in
    /// fewer steps than the user prepared answers for.
    pub async fn run(
        &self,
        protocol: &dyn FlowProtocol,
        subject: &FlowSubject,
        answer_sets: &[AnswerMap],
    ) -> FlowResult<FlowReceipt> {
        let handle = protocol
            .init(subject, &self.context)
            .await
            .map_err(|err| match err {
                ProtocolError::UnknownHandler => FlowError::UnknownHandler {
                    subject: subject.to_string(),
                },
                other => FlowError::Protocol(other),
            })?;

        debug!(run_id = %handle.run_id, %subject, "flow run initiated");
        let run_id = handle.run_id;
        let outcome = self
            .drive(protocol, &run_id, subject, handle.step, answer_sets)
            .await;

        if let Err(err) = &outcome {
            if !err.is_terminal_abort() {
                debug!(run_id = %run_id, %subject, "aborting failed flow run");
                match protocol.abort(&run_id).await {
                    Ok(()) | Err(ProtocolError::UnknownRun(_)) => {}
                    Err(abort_err) => {
                        warn!(run_id = %run_id, error = %abort_err, "flow abort failed");
                    }
                }
            }
        }

        outcome
    }

    async fn drive(
        &self,
        protocol: &dyn FlowProtocol,
        run_id: &FlowRunId,
        subject: &FlowSubject,
        first_step: FlowStep,
        answer_sets: &[AnswerMap],
    ) -> FlowResult<FlowReceipt> {
        let mut step = first_step;

        for answers in answer_sets {
            let form = match Self::inspect(subject, step)? {
                Inspected::Done(receipt) => return Ok(receipt),
                Inspected::Form(form) => form,
            };

            let selected = form.schema.select(answers);
            debug!(run_id = %run_id, step_id = %form.step_id, "submitting answers");
            step = protocol
                .configure(run_id, selected)
                .await
                .map_err(|err| match err {
                    ProtocolError::InvalidAnswers(detail) => FlowError::SchemaMismatch {
                        subject: subject.to_string(),
                        detail: format!(
                            "{detail}; step {} accepts: {}",
                            form.step_id,
                            form.schema.describe()
                        ),
                    },
                    other => FlowError::Protocol(other),
                })?;
        }

        // A flow may land on its terminal step with the final answer set.
        match Self::inspect(subject, step)? {
            Inspected::Done(receipt) => Ok(receipt),
            Inspected::Form(form) => Err(FlowError::SchemaMismatch {
                subject: subject.to_string(),
                detail: format!(
                    "all answer sets used but step {} still expects: {}",
                    form.step_id,
                    form.schema.describe()
                ),
            }),
        }
    }

    fn inspect(subject: &FlowSubject, step: FlowStep) -> FlowResult<Inspected> {
        match step {
            FlowStep::Form(form) if form.has_blocking_errors() => {
                Err(FlowError::StepValidation {
                    subject: subject.to_string(),
                    errors: form.errors,
                })
            }
            FlowStep::Form(form) => Ok(Inspected::Form(form)),
            FlowStep::Finished(receipt) => Ok(Inspected::Done(receipt)),
            FlowStep::Aborted { reason } if reason == REASON_ALREADY_CONFIGURED => {
                Err(FlowError::AlreadyConfigured {
                    subject: subject.to_string(),
                })
            }
            FlowStep::Aborted { reason } => Err(FlowError::Aborted {
                subject: subject.to_string(),
                reason,
            }),
        }
    }
}
