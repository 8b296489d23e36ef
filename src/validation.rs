//! Input validation for bulk deletion requests
//!
//! Everything here runs before the first remote call, so a malformed request
//! never creates a job.

use crate::error::{BulkDeleteError, Result};

/// Longest query the remote query endpoint accepts
const MAX_QUERY_LENGTH: usize = 100_000;

/// Longest API name an object can have, including a namespace prefix and `__c`
const MAX_OBJECT_NAME_LENGTH: usize = 80;

/// Validates the record-selection query
pub fn validate_query(query: &str) -> Result<()> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(BulkDeleteError::validation("query must not be empty"));
    }

    if query.len() > MAX_QUERY_LENGTH {
        return Err(BulkDeleteError::validation(format!(
            "query too long: {} characters (max: {MAX_QUERY_LENGTH})",
            query.len()
        )));
    }

    if !trimmed
        .get(..6)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("select"))
    {
        return Err(BulkDeleteError::validation(
            "query must be a SELECT statement",
        ));
    }

    Ok(())
}

/// Validates the API name of the object to delete from
pub fn validate_object_name(object_name: &str) -> Result<()> {
    if object_name.is_empty() {
        return Err(BulkDeleteError::validation("object name must not be empty"));
    }

    if object_name.len() > MAX_OBJECT_NAME_LENGTH {
        return Err(BulkDeleteError::validation(format!(
            "object name too long: {} characters (max: {MAX_OBJECT_NAME_LENGTH})",
            object_name.len()
        )));
    }

    let starts_with_letter = object_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = object_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !starts_with_letter || !valid_chars {
        return Err(BulkDeleteError::validation(format!(
            "invalid object name '{object_name}': expected an API name such as Account or Invoice__c"
        )));
    }

    Ok(())
}

/// Validates batch size and worker count
pub fn validate_limits(batch_size: usize, max_workers: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(BulkDeleteError::validation(
            "batch size must be greater than zero",
        ));
    }
    if max_workers == 0 {
        return Err(BulkDeleteError::validation(
            "max workers must be greater than zero",
        ));
    }
    Ok(())
}

/// Validates a complete bulk deletion request
pub fn validate_bulk_delete_request(
    query: &str,
    object_name: &str,
    batch_size: usize,
    max_workers: usize,
) -> Result<()> {
    validate_query(query)?;
    validate_object_name(object_name)?;
    validate_limits(batch_size, max_workers)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_validation() {
        assert!(validate_query("SELECT Id FROM Account WHERE Name = 'x'").is_ok());
        assert!(validate_query("  select Id from Contact").is_ok());

        assert!(validate_query("").is_err());
        assert!(validate_query("   ").is_err());
        assert!(validate_query("DELETE FROM Account").is_err());
        assert!(validate_query("SEL").is_err());

        let long = format!("SELECT Id FROM Account WHERE Name = '{}'", "a".repeat(MAX_QUERY_LENGTH));
        assert!(validate_query(&long).is_err());
    }

    #[test]
    fn test_object_name_validation() {
        assert!(validate_object_name("Account").is_ok());
        assert!(validate_object_name("Invoice__c").is_ok());
        assert!(validate_object_name("ns__Invoice__c").is_ok());

        assert!(validate_object_name("").is_err());
        assert!(validate_object_name("__c").is_err());
        assert!(validate_object_name("Account; DROP").is_err());
        assert!(validate_object_name("Acc-ount").is_err());
        assert!(validate_object_name(&"A".repeat(MAX_OBJECT_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_limits_validation() {
        assert!(validate_limits(1, 1).is_ok());
        assert!(validate_limits(10_000, 5).is_ok());

        let err = validate_limits(0, 5).unwrap_err();
        assert!(err.to_string().contains("batch size"));
        let err = validate_limits(10, 0).unwrap_err();
        assert!(err.to_string().contains("max workers"));
    }

    #[test]
    fn test_full_request_validation() {
        assert!(validate_bulk_delete_request("SELECT Id FROM Account", "Account", 10_000, 5).is_ok());
        assert!(matches!(
            validate_bulk_delete_request("SELECT Id FROM Account", "", 10_000, 5),
            Err(BulkDeleteError::Validation { .. })
        ));
    }
}
