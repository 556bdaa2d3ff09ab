//! The enrollment commit: one paid selection becomes a ledger entry plus
//! counter updates, all inside a single store transaction.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::EnrollmentCoordinator;
use crate::domain::ports::{EnrollmentStoreError, EnrollmentTransaction, SeatUpdate};
use crate::domain::{ClassId, Email, Error, PaymentId, PaymentProof, PaymentRecord, SelectionId};

/// Inputs of one commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Authenticated caller; must own the selection.
    pub student: Email,
    /// Class the caller believes the selection is for.
    pub class_id: ClassId,
    /// Selection to consume; the idempotency key.
    pub selection_id: SelectionId,
    /// Provider confirmation; its amount must match the selection price.
    pub proof: PaymentProof,
}

/// The five writes of a commit, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitStep {
    /// Record the ledger entry.
    AppendPayment,
    /// Consume the selection.
    RemoveSelection,
    /// Count the enrollment on the class.
    IncrementEnrolled,
    /// Take a seat, only if one is left.
    DecrementSeats,
    /// Count the student for the class's instructor.
    CreditInstructor,
}

impl CommitStep {
    /// Every step in execution order.
    pub const ALL: [Self; 5] = [
        Self::AppendPayment,
        Self::RemoveSelection,
        Self::IncrementEnrolled,
        Self::DecrementSeats,
        Self::CreditInstructor,
    ];
}

/// What happened to one step during a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Written and committed.
    Applied,
    /// This step caused the abort.
    Failed,
    /// Written, then undone by the rollback.
    RolledBack,
    /// Never reached: an earlier check or step stopped the commit.
    NotAttempted,
    /// Not needed: the selection was already committed earlier.
    Skipped,
}

/// Outcome of one named step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StepReport {
    /// The step.
    pub step: CommitStep,
    /// What happened to it.
    pub outcome: StepOutcome,
}

/// Overall result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    /// All five steps applied in this attempt.
    Committed,
    /// The selection was committed earlier; the recorded payment is returned
    /// and nothing was written.
    Replayed,
    /// Nothing was written.
    Aborted,
}

/// Why a commit aborted. `step` is absent when the abort happened during the
/// checks that precede any write, or while committing the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitFailure {
    /// Step that failed, if the abort happened during one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<CommitStep>,
    /// Error reported to the caller.
    pub error: Error,
}

/// Per-step report of a commit attempt.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    /// Overall outcome.
    pub status: CommitStatus,
    /// The ledger entry, on commit or replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    /// Present only when aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<CommitFailure>,
    /// One report per step, in execution order.
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, Copy)]
enum AbortPoint {
    BeforeWrites,
    Step(CommitStep),
    Commit,
}

impl AbortPoint {
    fn step(self) -> Option<CommitStep> {
        match self {
            Self::Step(step) => Some(step),
            Self::BeforeWrites | Self::Commit => None,
        }
    }

    fn outcome_of(self, step: CommitStep) -> StepOutcome {
        match self {
            Self::BeforeWrites => StepOutcome::NotAttempted,
            Self::Commit => StepOutcome::RolledBack,
            Self::Step(failed) => {
                let position = |s: CommitStep| CommitStep::ALL.iter().position(|c| *c == s);
                match position(step).cmp(&position(failed)) {
                    std::cmp::Ordering::Less => StepOutcome::RolledBack,
                    std::cmp::Ordering::Equal => StepOutcome::Failed,
                    std::cmp::Ordering::Greater => StepOutcome::NotAttempted,
                }
            }
        }
    }
}

fn uniform_steps(outcome: StepOutcome) -> Vec<StepReport> {
    CommitStep::ALL
        .into_iter()
        .map(|step| StepReport { step, outcome })
        .collect()
}

impl CommitResult {
    fn committed(payment: PaymentRecord) -> Self {
        Self {
            status: CommitStatus::Committed,
            payment: Some(payment),
            failure: None,
            steps: uniform_steps(StepOutcome::Applied),
        }
    }

    fn replayed(payment: PaymentRecord) -> Self {
        Self {
            status: CommitStatus::Replayed,
            payment: Some(payment),
            failure: None,
            steps: uniform_steps(StepOutcome::Skipped),
        }
    }

    fn aborted(point: AbortPoint, error: Error) -> Self {
        let steps = CommitStep::ALL
            .into_iter()
            .map(|step| StepReport {
                step,
                outcome: point.outcome_of(step),
            })
            .collect();
        Self {
            status: CommitStatus::Aborted,
            payment: None,
            failure: Some(CommitFailure {
                step: point.step(),
                error,
            }),
            steps,
        }
    }

    /// Whether the selection is now paid, by this call or an earlier one.
    pub fn is_success(&self) -> bool {
        matches!(self.status, CommitStatus::Committed | CommitStatus::Replayed)
    }

    /// Turn an aborted result into its error, carrying the step report in
    /// `details.steps`.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.status != CommitStatus::Aborted {
            return Ok(self);
        }
        let Some(failure) = self.failure else {
            return Err(Error::internal("enrollment commit aborted"));
        };
        let details = json!({
            "failedStep": failure.step,
            "steps": self.steps,
        });
        Err(failure.error.with_details(details))
    }
}

/// Early exit from the write sequence.
enum Halt {
    Replay(PaymentRecord),
    /// Another commit appended a payment for the selection first.
    Duplicate,
    Abort(AbortPoint, Error),
}

impl Halt {
    fn at(step: CommitStep, error: Error) -> Self {
        Self::Abort(AbortPoint::Step(step), error)
    }

    fn before_writes(error: Error) -> Self {
        Self::Abort(AbortPoint::BeforeWrites, error)
    }
}

fn map_store_error(error: EnrollmentStoreError) -> Error {
    debug!(%error, "enrollment store failure");
    match error {
        EnrollmentStoreError::Connection { .. } => {
            Error::service_unavailable("enrollment store unavailable")
        }
        EnrollmentStoreError::Query { .. } => Error::internal("enrollment store error"),
        EnrollmentStoreError::DuplicatePayment { .. } => Error::conflict("selection already paid"),
    }
}

fn seat_conflict(class_id: ClassId) -> Error {
    Error::conflict("seat no longer available").with_details(json!({ "classId": class_id }))
}

impl EnrollmentCoordinator {
    /// Commit a paid selection.
    ///
    /// Every write happens in one store transaction, so the result is either
    /// all five steps applied or none. Retrying with the same selection id
    /// returns the original ledger entry as a replay.
    pub async fn commit_enrollment(&self, request: CommitRequest) -> CommitResult {
        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(error) => {
                return self.finish_abort(&request, AbortPoint::BeforeWrites, map_store_error(error));
            }
        };

        match self.apply_steps(tx.as_mut(), &request).await {
            Ok(record) => match tx.commit().await {
                Ok(()) => {
                    info!(
                        student = %request.student,
                        class_id = %request.class_id,
                        selection_id = %request.selection_id,
                        payment_id = %record.id,
                        "enrollment committed"
                    );
                    CommitResult::committed(record)
                }
                Err(EnrollmentStoreError::DuplicatePayment { .. }) => {
                    self.resolve_duplicate(&request).await
                }
                Err(error) => self.finish_abort(&request, AbortPoint::Commit, map_store_error(error)),
            },
            Err(halt) => {
                if let Err(error) = tx.rollback().await {
                    debug!(%error, "rollback failed; transaction dropped");
                }
                match halt {
                    Halt::Replay(record) => {
                        info!(
                            selection_id = %request.selection_id,
                            payment_id = %record.id,
                            "enrollment commit replayed"
                        );
                        CommitResult::replayed(record)
                    }
                    Halt::Duplicate => self.resolve_duplicate(&request).await,
                    Halt::Abort(point, error) => self.finish_abort(&request, point, error),
                }
            }
        }
    }

    async fn apply_steps(
        &self,
        tx: &mut dyn EnrollmentTransaction,
        request: &CommitRequest,
    ) -> Result<PaymentRecord, Halt> {
        let selection_id = request.selection_id;
        let locked = tx
            .lock_selection(selection_id)
            .await
            .map_err(|e| Halt::before_writes(map_store_error(e)))?;

        if let Some(existing) = tx
            .find_payment_for_selection(selection_id)
            .await
            .map_err(|e| Halt::before_writes(map_store_error(e)))?
        {
            if existing.student_email != request.student {
                return Err(Halt::before_writes(Error::forbidden("forbidden access")));
            }
            return Err(Halt::Replay(existing));
        }

        let selection = locked.ok_or_else(|| {
            Halt::before_writes(Error::not_found(format!(
                "selection {selection_id} not found"
            )))
        })?;
        if !selection.is_owned_by(&request.student) {
            return Err(Halt::before_writes(Error::forbidden("forbidden access")));
        }
        if selection.class_id != request.class_id {
            return Err(Halt::before_writes(Error::invalid_request(
                "selection does not reference this class",
            )));
        }
        if request.proof.amount != selection.price {
            return Err(Halt::before_writes(
                Error::invalid_request("payment amount does not match the selection price")
                    .with_details(json!({
                        "expected": selection.price.cents(),
                        "received": request.proof.amount.cents(),
                    })),
            ));
        }
        let transaction_id = request.proof.transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(Halt::before_writes(Error::invalid_request(
                "transaction id must not be empty",
            )));
        }

        let record = PaymentRecord {
            id: PaymentId::random(),
            student_email: request.student.clone(),
            class_id: selection.class_id,
            amount: selection.price,
            selection_id,
            transaction_id: transaction_id.to_owned(),
            paid_at: self.clock.utc(),
        };
        let class_id = selection.class_id;

        tx.append_payment(&record).await.map_err(|e| match e {
            EnrollmentStoreError::DuplicatePayment { .. } => Halt::Duplicate,
            other => Halt::at(CommitStep::AppendPayment, map_store_error(other)),
        })?;

        let removed = tx
            .remove_selection(selection_id)
            .await
            .map_err(|e| Halt::at(CommitStep::RemoveSelection, map_store_error(e)))?;
        if !removed {
            return Err(Halt::at(
                CommitStep::RemoveSelection,
                Error::not_found(format!("selection {selection_id} not found")),
            ));
        }

        let incremented = tx
            .increment_enrolled(class_id)
            .await
            .map_err(|e| Halt::at(CommitStep::IncrementEnrolled, map_store_error(e)))?;
        if !incremented {
            return Err(Halt::at(
                CommitStep::IncrementEnrolled,
                Error::not_found(format!("class {class_id} not found")),
            ));
        }

        match tx
            .take_seat(class_id)
            .await
            .map_err(|e| Halt::at(CommitStep::DecrementSeats, map_store_error(e)))?
        {
            SeatUpdate::Taken => {}
            SeatUpdate::SoldOut => {
                return Err(Halt::at(CommitStep::DecrementSeats, seat_conflict(class_id)));
            }
            SeatUpdate::ClassMissing => {
                return Err(Halt::at(
                    CommitStep::DecrementSeats,
                    Error::not_found(format!("class {class_id} not found")),
                ));
            }
        }

        let instructor = tx
            .find_class_instructor(class_id)
            .await
            .map_err(|e| Halt::at(CommitStep::CreditInstructor, map_store_error(e)))?
            .ok_or_else(|| {
                Halt::at(
                    CommitStep::CreditInstructor,
                    Error::not_found(format!("class {class_id} not found")),
                )
            })?;
        let credited = tx
            .credit_instructor(&instructor)
            .await
            .map_err(|e| Halt::at(CommitStep::CreditInstructor, map_store_error(e)))?;
        if !credited {
            return Err(Halt::at(
                CommitStep::CreditInstructor,
                Error::not_found(format!("instructor {instructor} not found")),
            ));
        }

        Ok(record)
    }

    /// A concurrent commit recorded the payment first; report theirs.
    async fn resolve_duplicate(&self, request: &CommitRequest) -> CommitResult {
        let lookup = async {
            let mut tx = self.store.begin().await?;
            let existing = tx.find_payment_for_selection(request.selection_id).await;
            tx.rollback().await?;
            existing
        };
        match lookup.await {
            Ok(Some(existing)) if existing.student_email == request.student => {
                CommitResult::replayed(existing)
            }
            Ok(Some(_)) => self.finish_abort(
                request,
                AbortPoint::BeforeWrites,
                Error::forbidden("forbidden access"),
            ),
            Ok(None) => self.finish_abort(
                request,
                AbortPoint::Step(CommitStep::AppendPayment),
                Error::conflict("selection already paid"),
            ),
            Err(error) => {
                self.finish_abort(request, AbortPoint::BeforeWrites, map_store_error(error))
            }
        }
    }

    fn finish_abort(&self, request: &CommitRequest, point: AbortPoint, error: Error) -> CommitResult {
        warn!(
            student = %request.student,
            class_id = %request.class_id,
            selection_id = %request.selection_id,
            step = ?point.step(),
            code = ?error.code(),
            "enrollment commit aborted"
        );
        CommitResult::aborted(point, error)
    }
}
