//! In-process adapters for every store port.
//!
//! Used when no database URL is configured and as the fake behind coordinator
//! and HTTP tests. All four stores share one state value behind a
//! `tokio::sync::Mutex`; a transaction holds the owned guard for its whole
//! lifetime and edits a draft copy, so transactions are serialised and a
//! rollback is just dropping the draft.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ports::{
    ClassRepository, ClassRepositoryError, EnrollmentStore, EnrollmentStoreError,
    EnrollmentTransaction, PaymentLedger, PaymentLedgerError, SeatUpdate, SelectionRepository,
    SelectionRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    ClassId, ClassOffering, Email, PaymentRecord, Role, Selection, SelectionId, User,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    users: BTreeMap<Email, User>,
    classes: HashMap<ClassId, ClassOffering>,
    selections: HashMap<SelectionId, Selection>,
    payments: Vec<PaymentRecord>,
}

impl StoreState {
    fn payment_for_selection(&self, selection: SelectionId) -> Option<&PaymentRecord> {
        self.payments
            .iter()
            .find(|payment| payment.selection_id == selection)
    }
}

/// Shared in-memory credential, catalog, selection and ledger stores.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStores {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record.
    pub async fn seed_user(&self, user: User) {
        let mut state = self.state.lock().await;
        state.users.insert(user.email().clone(), user);
    }

    /// Insert or replace a class record. Classes are managed outside this
    /// service, so this is the only way they enter the in-memory catalog.
    pub async fn seed_class(&self, class: ClassOffering) {
        let mut state = self.state.lock().await;
        state.classes.insert(class.id(), class);
    }

    /// Current committed view of a class.
    pub async fn class(&self, id: ClassId) -> Option<ClassOffering> {
        self.state.lock().await.classes.get(&id).cloned()
    }

    /// Current committed view of a user.
    pub async fn user(&self, email: &Email) -> Option<User> {
        self.state.lock().await.users.get(email).cloned()
    }

    /// Every committed ledger entry, in append order.
    pub async fn payments(&self) -> Vec<PaymentRecord> {
        self.state.lock().await.payments.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryStores {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.state.lock().await.users.get(email).cloned())
    }

    async fn insert_if_absent(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.contains_key(user.email()) {
            return Ok(false);
        }
        state.users.insert(user.email().clone(), user.clone());
        Ok(true)
    }

    async fn update_role(&self, email: &Email, role: Role) -> Result<bool, UserRepositoryError> {
        let mut state = self.state.lock().await;
        Ok(match state.users.get_mut(email) {
            Some(user) => {
                user.set_role(role);
                true
            }
            None => false,
        })
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }
}

#[async_trait]
impl ClassRepository for InMemoryStores {
    async fn find_by_id(&self, id: ClassId) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(self.class(id).await)
    }
}

#[async_trait]
impl SelectionRepository for InMemoryStores {
    async fn insert(&self, selection: &Selection) -> Result<(), SelectionRepositoryError> {
        let mut state = self.state.lock().await;
        let taken = state.selections.values().any(|existing| {
            existing.student_email == selection.student_email
                && existing.class_id == selection.class_id
        });
        if taken {
            return Err(SelectionRepositoryError::duplicate(format!(
                "{} already selected {}",
                selection.student_email, selection.class_id
            )));
        }
        state.selections.insert(selection.id, selection.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: SelectionId,
    ) -> Result<Option<Selection>, SelectionRepositoryError> {
        Ok(self.state.lock().await.selections.get(&id).cloned())
    }

    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<Selection>, SelectionRepositoryError> {
        let state = self.state.lock().await;
        let mut selections: Vec<Selection> = state
            .selections
            .values()
            .filter(|selection| selection.is_owned_by(student))
            .cloned()
            .collect();
        selections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(selections)
    }

    async fn delete_for_student(
        &self,
        id: SelectionId,
        student: &Email,
    ) -> Result<bool, SelectionRepositoryError> {
        let mut state = self.state.lock().await;
        let owned = state
            .selections
            .get(&id)
            .is_some_and(|selection| selection.is_owned_by(student));
        if owned {
            state.selections.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStores {
    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<PaymentRecord>, PaymentLedgerError> {
        let state = self.state.lock().await;
        let mut payments: Vec<PaymentRecord> = state
            .payments
            .iter()
            .filter(|payment| &payment.student_email == student)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }

    async fn has_paid(&self, student: &Email, class: ClassId) -> Result<bool, PaymentLedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .any(|payment| &payment.student_email == student && payment.class_id == class))
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStores {
    async fn begin(&self) -> Result<Box<dyn EnrollmentTransaction>, EnrollmentStoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let draft = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, draft }))
    }
}

/// Exclusive transaction over [`InMemoryStores`].
struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    draft: StoreState,
}

#[async_trait]
impl EnrollmentTransaction for InMemoryTransaction {
    async fn find_payment_for_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<PaymentRecord>, EnrollmentStoreError> {
        Ok(self.draft.payment_for_selection(selection).cloned())
    }

    async fn lock_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<Selection>, EnrollmentStoreError> {
        Ok(self.draft.selections.get(&selection).cloned())
    }

    async fn append_payment(&mut self, record: &PaymentRecord) -> Result<(), EnrollmentStoreError> {
        if self.draft.payment_for_selection(record.selection_id).is_some() {
            return Err(EnrollmentStoreError::duplicate_payment(
                record.selection_id.to_string(),
            ));
        }
        self.draft.payments.push(record.clone());
        Ok(())
    }

    async fn remove_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<bool, EnrollmentStoreError> {
        Ok(self.draft.selections.remove(&selection).is_some())
    }

    async fn increment_enrolled(&mut self, class: ClassId) -> Result<bool, EnrollmentStoreError> {
        Ok(match self.draft.classes.get_mut(&class) {
            Some(offering) => {
                offering.increment_enrolled();
                true
            }
            None => false,
        })
    }

    async fn take_seat(&mut self, class: ClassId) -> Result<SeatUpdate, EnrollmentStoreError> {
        Ok(match self.draft.classes.get_mut(&class) {
            Some(offering) => {
                if offering.try_take_seat() {
                    SeatUpdate::Taken
                } else {
                    SeatUpdate::SoldOut
                }
            }
            None => SeatUpdate::ClassMissing,
        })
    }

    async fn find_class_instructor(
        &mut self,
        class: ClassId,
    ) -> Result<Option<Email>, EnrollmentStoreError> {
        Ok(self
            .draft
            .classes
            .get(&class)
            .map(|offering| offering.instructor_email().clone()))
    }

    async fn credit_instructor(&mut self, instructor: &Email) -> Result<bool, EnrollmentStoreError> {
        Ok(match self.draft.users.get_mut(instructor) {
            Some(user) => {
                user.credit_student();
                true
            }
            None => false,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), EnrollmentStoreError> {
        let Self { mut guard, draft } = *self;
        *guard = draft;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), EnrollmentStoreError> {
        Ok(())
    }
}
