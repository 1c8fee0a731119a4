//! Result type alias for the extractor

use super::errors::ExtractError;

/// Result type alias for extractor operations
///
/// # Examples
///
/// ```
/// use qpp_extract::domain::result::Result;
/// use qpp_extract::domain::errors::ExtractError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExtractError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExtractError>;
