//! Multipart field names understood by the upload endpoint.

/// The fixed-width payment batch itself.
pub const FILE_FIELD: &str = "file";
/// Execution date as `YYYYMMDD`.
pub const EXECUTION_DATE_FIELD: &str = "executionDate";
/// 22 character account identifier of the ordering party.
pub const IBAN_FIELD: &str = "iban";
/// Free text, upper-cased into the generated header.
pub const COMPANY_NAME_FIELD: &str = "companyName";
