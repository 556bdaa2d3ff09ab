//! Class catalog fixture for the in-memory stores.
//!
//! Classes are authored outside this service. With PostgreSQL they already
//! live in the `classes` table; without a database the server reads them from
//! an optional JSON file so the enrollment flow can be exercised locally:
//!
//! ```json
//! {
//!   "classes": [
//!     {
//!       "name": "Watercolour basics",
//!       "instructorEmail": "tutor@example.com",
//!       "priceCents": 5000,
//!       "capacity": 12
//!     }
//!   ]
//! }
//! ```
//!
//! `id` is optional (a random id is assigned) and `status` defaults to
//! `approved`. Every class starts with all seats available.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use enrollment::domain::{
    Amount, ClassId, ClassOffering, ClassOfferingParts, ClassStatus, ClassValidationError, Email,
};

/// Errors raised while loading the catalog fixture.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read catalog at {}: {source}", path.display())]
    Read {
        /// Configured path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a catalog document.
    #[error("catalog at {} is not valid JSON: {source}", path.display())]
    Parse {
        /// Configured path.
        path: PathBuf,
        /// Decoder error, with line and column.
        #[source]
        source: serde_json::Error,
    },
    /// An entry parsed but describes an impossible class.
    #[error("catalog entry {index} is invalid: {reason}")]
    Invalid {
        /// Zero-based position in `classes`.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    classes: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CatalogEntry {
    id: Option<Uuid>,
    name: String,
    instructor_email: String,
    price_cents: u64,
    capacity: u32,
    #[serde(default = "approved")]
    status: ClassStatus,
}

fn approved() -> ClassStatus {
    ClassStatus::Approved
}

impl CatalogEntry {
    fn into_offering(self, index: usize) -> Result<ClassOffering, CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid { index, reason };
        let instructor_email =
            Email::new(&self.instructor_email).map_err(|err| invalid(err.to_string()))?;
        ClassOffering::from_parts(ClassOfferingParts {
            id: self.id.map_or_else(ClassId::random, ClassId::from_uuid),
            name: self.name,
            instructor_email,
            price: Amount::from_cents(self.price_cents),
            capacity: self.capacity,
            available_seats: self.capacity,
            enrolled: 0,
            status: self.status,
        })
        .map_err(|err: ClassValidationError| invalid(err.to_string()))
    }
}

/// Read and validate the catalog fixture at `path`.
///
/// # Errors
///
/// [`CatalogError`] when the file is unreadable, malformed, or holds an
/// invalid entry. Duplicate ids are invalid.
pub fn load_catalog(path: &Path) -> Result<Vec<ClassOffering>, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: CatalogDocument =
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    document
        .classes
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let offering = entry.into_offering(index)?;
            if !seen.insert(offering.id()) {
                return Err(CatalogError::Invalid {
                    index,
                    reason: format!("duplicate class id {}", offering.id()),
                });
            }
            Ok(offering)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use rstest::rstest;
    use tempfile::NamedTempFile;

    fn catalog_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write catalog");
        file
    }

    #[rstest]
    fn entries_become_classes_with_every_seat_open() {
        let id = Uuid::new_v4();
        let file = catalog_file(&format!(
            r#"{{"classes": [
                {{"id": "{id}", "name": "Pottery", "instructorEmail": "tutor@example.com",
                  "priceCents": 4500, "capacity": 8}},
                {{"name": "Drafts", "instructorEmail": "tutor@example.com",
                  "priceCents": 100, "capacity": 1, "status": "pending"}}
            ]}}"#
        ));

        let classes = load_catalog(file.path()).expect("catalog loads");

        let [pottery, drafts] = classes.as_slice() else {
            panic!("expected two classes, got {classes:?}");
        };
        assert_eq!(pottery.id(), ClassId::from_uuid(id));
        assert_eq!(pottery.price(), Amount::from_cents(4500));
        assert_eq!((pottery.available_seats(), pottery.enrolled()), (8, 0));
        assert!(pottery.is_approved());
        assert_eq!(drafts.status(), ClassStatus::Pending);
    }

    #[rstest]
    #[case::bad_email(
        r#"{"classes": [{"name": "X", "instructorEmail": "nobody", "priceCents": 1, "capacity": 1}]}"#
    )]
    #[case::blank_name(
        r#"{"classes": [{"name": " ", "instructorEmail": "t@example.com", "priceCents": 1, "capacity": 1}]}"#
    )]
    fn impossible_entries_are_rejected(#[case] contents: &str) {
        let file = catalog_file(contents);
        let err = load_catalog(file.path()).expect_err("invalid entry");
        assert!(
            matches!(err, CatalogError::Invalid { index: 0, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[rstest]
    fn duplicate_ids_are_rejected() {
        let id = Uuid::new_v4();
        let entry = format!(
            r#"{{"id": "{id}", "name": "X", "instructorEmail": "t@example.com", "priceCents": 1, "capacity": 1}}"#
        );
        let file = catalog_file(&format!(r#"{{"classes": [{entry}, {entry}]}}"#));
        let err = load_catalog(file.path()).expect_err("duplicate id");
        assert!(matches!(err, CatalogError::Invalid { index: 1, .. }));
    }

    #[rstest]
    #[case::unknown_field(r#"{"classes": [], "extra": true}"#)]
    #[case::not_json("classes: []")]
    fn malformed_documents_are_parse_errors(#[case] contents: &str) {
        let file = catalog_file(contents);
        let err = load_catalog(file.path()).expect_err("malformed");
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[rstest]
    fn bundled_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/catalog.json");
        let classes = load_catalog(&path).expect("fixture loads");
        assert_eq!(classes.len(), 3);
        assert_eq!(classes.iter().filter(|c| c.is_approved()).count(), 2);
    }

    #[rstest]
    fn missing_files_are_read_errors() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).expect_err("missing");
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
