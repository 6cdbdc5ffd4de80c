//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR};

pub const DUPLICATE_KEY: i32 = 11000;
pub const WRITE_CONFLICT: i32 = 112;

/// Return true if the given error is a duplicate key write error, from either
/// a single write or a bulk write.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(ref failure) => failure
            .write_errors
            .as_ref()
            .map_or(false, |errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        _ => false,
    }
}

/// Return true if the given error means another transaction touched the same
/// documents first.
pub fn is_write_conflict(err: &DbError) -> bool {
    if err.contains_label(TRANSIENT_TRANSACTION_ERROR) {
        return true;
    }
    match *err.kind {
        ErrorKind::Command(ref e) => e.code == WRITE_CONFLICT,
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == WRITE_CONFLICT,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use mongodb::{
        bson::{doc, from_document},
        error::{BulkWriteFailure, CommandError, WriteError},
    };

    use super::*;

    fn write_error(code: i32) -> DbError {
        let e: WriteError = from_document(doc! { "code": code, "errmsg": "E11000" }).unwrap();
        ErrorKind::Write(WriteFailure::WriteError(e)).into()
    }

    fn bulk_write_error(codes: &[i32]) -> DbError {
        let errors: Vec<_> = codes
            .iter()
            .enumerate()
            .map(|(index, &code)| doc! { "index": index as i64, "code": code })
            .collect();
        let failure: BulkWriteFailure = from_document(doc! { "writeErrors": errors }).unwrap();
        ErrorKind::BulkWrite(failure).into()
    }

    fn command_error(code: i32) -> DbError {
        let e: CommandError =
            from_document(doc! { "code": code, "codeName": "WriteConflict" }).unwrap();
        ErrorKind::Command(e).into()
    }

    #[test]
    fn duplicate_keys_from_single_writes() {
        assert!(is_duplicate_key_error(&write_error(DUPLICATE_KEY)));
        assert!(!is_duplicate_key_error(&write_error(WRITE_CONFLICT)));
    }

    #[test]
    fn duplicate_keys_from_bulk_writes() {
        assert!(is_duplicate_key_error(&bulk_write_error(&[DUPLICATE_KEY])));
        assert!(is_duplicate_key_error(&bulk_write_error(&[121, DUPLICATE_KEY])));
        assert!(!is_duplicate_key_error(&bulk_write_error(&[121])));
        assert!(!is_duplicate_key_error(&bulk_write_error(&[])));
    }

    #[test]
    fn other_errors_are_not_duplicates() {
        assert!(!is_duplicate_key_error(&command_error(DUPLICATE_KEY)));
    }

    #[test]
    fn write_conflicts() {
        assert!(is_write_conflict(&command_error(WRITE_CONFLICT)));
        assert!(is_write_conflict(&write_error(WRITE_CONFLICT)));
        assert!(!is_write_conflict(&write_error(DUPLICATE_KEY)));
        assert!(!is_write_conflict(&command_error(13)));
    }
}
