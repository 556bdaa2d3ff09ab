//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update this file alongside it (or regenerate
//! it with `diesel print-schema`).

diesel::table! {
    /// Credential store. `email` is the identity key.
    users (email) {
        email -> Text,
        name -> Nullable<Text>,
        photo_url -> Nullable<Text>,
        /// One of `student`, `instructor`, `admin`.
        role -> Text,
        /// Paid enrollments across the instructor's classes.
        students -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalog store.
    classes (id) {
        id -> Uuid,
        name -> Text,
        instructor_email -> Text,
        price_cents -> Int8,
        capacity -> Int4,
        available_seats -> Int4,
        enrolled -> Int4,
        /// One of `pending`, `approved`, `rejected`.
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending selections, unique per (student_email, class_id).
    selections (id) {
        id -> Uuid,
        student_email -> Text,
        class_id -> Uuid,
        class_name -> Text,
        price_cents -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only payment ledger, unique per selection_id.
    payments (id) {
        id -> Uuid,
        student_email -> Text,
        class_id -> Uuid,
        amount_cents -> Int8,
        selection_id -> Uuid,
        transaction_id -> Text,
        paid_at -> Timestamptz,
    }
}

diesel::joinable!(selections -> classes (class_id));
diesel::joinable!(payments -> classes (class_id));

diesel::allow_tables_to_appear_in_same_query!(users, classes, selections, payments);
