//! Enrollment commit coordinator.
//!
//! Owns the selection lifecycle (select, list, remove), checkout (payment
//! intents) and the commit that turns a paid selection into an enrollment.
//! Every store is injected as a port so the coordinator runs unchanged over
//! the in-memory adapters in tests and PostgreSQL in production.

mod commit;

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    ClassRepository, ClassRepositoryError, EnrollmentStore, PaymentGateway, PaymentGatewayError,
    PaymentIntent, PaymentLedger, PaymentLedgerError, SelectionRepository,
    SelectionRepositoryError,
};
use crate::domain::{ClassId, Email, Error, PaymentRecord, Selection, SelectionId};

pub use commit::{
    CommitFailure, CommitRequest, CommitResult, CommitStatus, CommitStep, StepOutcome, StepReport,
};

/// Currency of every payment intent.
pub const CURRENCY: &str = "usd";

/// Ports the coordinator depends on.
#[derive(Clone)]
pub struct EnrollmentPorts {
    /// Catalog reads.
    pub classes: Arc<dyn ClassRepository>,
    /// Pending selections outside a commit.
    pub selections: Arc<dyn SelectionRepository>,
    /// Ledger reads.
    pub ledger: Arc<dyn PaymentLedger>,
    /// Transactions for the commit.
    pub store: Arc<dyn EnrollmentStore>,
    /// Payment intent creation.
    pub payments: Arc<dyn PaymentGateway>,
}

/// Orchestrates selections, checkout and the enrollment commit.
#[derive(Clone)]
pub struct EnrollmentCoordinator {
    classes: Arc<dyn ClassRepository>,
    selections: Arc<dyn SelectionRepository>,
    ledger: Arc<dyn PaymentLedger>,
    store: Arc<dyn EnrollmentStore>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

fn map_class_error(error: ClassRepositoryError) -> Error {
    debug!(%error, "class repository failure");
    match error {
        ClassRepositoryError::Connection { .. } => {
            Error::service_unavailable("catalog store unavailable")
        }
        ClassRepositoryError::Query { .. } => Error::internal("catalog store error"),
    }
}

fn map_selection_error(error: SelectionRepositoryError) -> Error {
    debug!(%error, "selection repository failure");
    match error {
        SelectionRepositoryError::Connection { .. } => {
            Error::service_unavailable("selection store unavailable")
        }
        SelectionRepositoryError::Query { .. } => Error::internal("selection store error"),
        SelectionRepositoryError::Duplicate { .. } => Error::conflict("class already selected"),
    }
}

fn map_ledger_error(error: PaymentLedgerError) -> Error {
    debug!(%error, "payment ledger failure");
    match error {
        PaymentLedgerError::Connection { .. } => {
            Error::service_unavailable("payment ledger unavailable")
        }
        PaymentLedgerError::Query { .. } => Error::internal("payment ledger error"),
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    debug!(%error, "payment gateway failure");
    match error {
        PaymentGatewayError::Connection { .. } => {
            Error::service_unavailable("payment provider unavailable")
        }
        PaymentGatewayError::Rejected { .. } => {
            Error::service_unavailable("payment provider rejected the request")
        }
    }
}

impl EnrollmentCoordinator {
    /// Bind the coordinator to its ports; `clock` stamps selections and
    /// ledger entries.
    #[must_use]
    pub fn new(ports: EnrollmentPorts, clock: Arc<dyn Clock>) -> Self {
        let EnrollmentPorts {
            classes,
            selections,
            ledger,
            store,
            payments,
        } = ports;
        Self {
            classes,
            selections,
            ledger,
            store,
            payments,
            clock,
        }
    }

    /// Record the student's intent to enroll in `class_id`, snapshotting the
    /// current price.
    pub async fn select_class(&self, student: &Email, class_id: ClassId) -> Result<Selection, Error> {
        let class = self
            .classes
            .find_by_id(class_id)
            .await
            .map_err(map_class_error)?
            .ok_or_else(|| Error::not_found(format!("class {class_id} not found")))?;
        if !class.is_approved() {
            return Err(Error::invalid_request("class is not open for enrollment")
                .with_details(json!({ "status": class.status() })));
        }
        if !class.has_free_seat() {
            return Err(Error::conflict("seat no longer available")
                .with_details(json!({ "classId": class_id })));
        }
        if self
            .ledger
            .has_paid(student, class_id)
            .await
            .map_err(map_ledger_error)?
        {
            return Err(Error::conflict("class already paid"));
        }

        let selection = Selection::snapshot(student.clone(), &class, self.clock.utc());
        self.selections
            .insert(&selection)
            .await
            .map_err(map_selection_error)?;
        info!(
            student = %student,
            class_id = %class_id,
            selection_id = %selection.id,
            "class selected"
        );
        Ok(selection)
    }

    /// The student's pending selections, oldest first.
    pub async fn list_selections(&self, student: &Email) -> Result<Vec<Selection>, Error> {
        self.selections
            .list_for_student(student)
            .await
            .map_err(map_selection_error)
    }

    /// Drop a selection the student owns.
    pub async fn remove_selection(&self, student: &Email, id: SelectionId) -> Result<(), Error> {
        let deleted = self
            .selections
            .delete_for_student(id, student)
            .await
            .map_err(map_selection_error)?;
        if !deleted {
            return Err(Error::not_found(format!("selection {id} not found")));
        }
        info!(student = %student, selection_id = %id, "selection removed");
        Ok(())
    }

    /// Ask the payment provider for an intent covering the selection's price
    /// snapshot.
    pub async fn prepare_payment(
        &self,
        student: &Email,
        id: SelectionId,
    ) -> Result<PaymentIntent, Error> {
        let selection = self
            .selections
            .find_by_id(id)
            .await
            .map_err(map_selection_error)?
            .filter(|selection| selection.is_owned_by(student))
            .ok_or_else(|| Error::not_found(format!("selection {id} not found")))?;
        let intent = self
            .payments
            .create_payment_intent(selection.price, CURRENCY)
            .await
            .map_err(map_gateway_error)?;
        debug!(selection_id = %id, amount = selection.price.cents(), "payment intent created");
        Ok(intent)
    }

    /// The student's ledger entries, newest first.
    pub async fn list_payments(&self, student: &Email) -> Result<Vec<PaymentRecord>, Error> {
        self.ledger
            .list_for_student(student)
            .await
            .map_err(map_ledger_error)
    }
}
