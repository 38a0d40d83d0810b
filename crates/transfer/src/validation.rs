use std::path::{Component, Path};

use crate::TransferError;

/// Validates that a file name names exactly one entry inside its storage area.
///
/// Rejects:
/// - Empty names
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Any separator, i.e. more than one path component
/// - `.` and `..`
pub fn validate_file_name(file_name: &str) -> Result<(), TransferError> {
    if file_name.is_empty() {
        return Err(TransferError::InvalidPath("empty file name".into()));
    }

    if file_name.contains('/') || file_name.contains('\\') {
        return Err(TransferError::InvalidPath(format!(
            "separators not allowed: {file_name}"
        )));
    }

    let path = Path::new(file_name);
    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_name}"
        )));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) => Err(TransferError::InvalidPath(format!(
            "parent directory traversal not allowed: {file_name}"
        ))),
        _ => Err(TransferError::InvalidPath(format!(
            "not a plain file name: {file_name}"
        ))),
    }
}
