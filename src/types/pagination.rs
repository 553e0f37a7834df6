use handle_errors::Error;
use std::collections::HashMap;

/// Pagination struct that is getting extracted
/// from query params
#[derive(Default, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// The maximum number of items to return.
    /// `None` returns everything after `offset`.
    pub limit: Option<u32>,
    /// The number of items to skip.
    pub offset: u32,
}

/// Extract query parameters from the `/question` route
/// # Example query
/// GET requests to this route can have a pagination attached so we just
/// return the questions we need
/// `/question?limit=10&offset=20`
/// # Example usage
/// ```rust
/// use std::collections::HashMap;
/// use questionnaire_api::types::pagination::extract_pagination;
///
/// let mut query = HashMap::new();
/// query.insert("limit".to_string(), "1".to_string());
/// query.insert("offset".to_string(), "10".to_string());
/// let p = extract_pagination(query).unwrap();
/// assert_eq!(p.limit, Some(1));
/// assert_eq!(p.offset, 10);
/// ```
pub fn extract_pagination(params: HashMap<String, String>) -> Result<Pagination, Error> {
    let limit = params
        .get("limit")
        .map(|limit| limit.parse::<u32>())
        .transpose()
        .map_err(Error::ParseError)?;

    let offset = params
        .get("offset")
        .map(|offset| offset.parse::<u32>())
        .transpose()
        .map_err(Error::ParseError)?
        .unwrap_or_default();

    Ok(Pagination { limit, offset })
}
