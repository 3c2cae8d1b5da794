//! Filter and sort specification for listing toys.

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `"1"` is ascending; every other token is descending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("1") => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn as_surql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    field: String,
    direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: &str, direction: SortDirection) -> Result<Self> {
        validate_field_path(field, field)?;
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    /// Parse a `<field>:<direction>` parameter such as `price:-1`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (field, token) = match raw.split_once(':') {
            Some((field, token)) => (field, Some(token)),
            None => (raw, None),
        };
        validate_field_path(field, raw)?;

        Ok(Self {
            field: field.to_string(),
            direction: SortDirection::from_token(token),
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

// Sort fields are interpolated into the query text, so only plain dotted
// identifier paths are let through.
fn validate_field_path(field: &str, raw: &str) -> Result<()> {
    if field.is_empty() {
        return Err(StoreError::invalid_sort(raw, "empty field name"));
    }

    for segment in field.split('.') {
        let mut chars = segment.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_head || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StoreError::invalid_sort(
                raw,
                format!("'{field}' is not a field path"),
            ));
        }
    }

    Ok(())
}

/// What `ToyStore::find` should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub email: Option<String>,
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from raw request parameters. Empty strings count as absent.
    pub fn from_params(email: Option<&str>, sort: Option<&str>) -> Result<Self> {
        let email = email.filter(|e| !e.is_empty()).map(str::to_string);
        let sort = sort
            .filter(|s| !s.is_empty())
            .map(SortSpec::parse)
            .transpose()?;
        Ok(Self { email, sort })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_token_one_is_ascending_anything_else_descending() {
        assert_eq!(SortSpec::parse("price:1").unwrap().direction(), SortDirection::Ascending);
        assert_eq!(SortSpec::parse("price:-1").unwrap().direction(), SortDirection::Descending);
        assert_eq!(SortSpec::parse("price:asc").unwrap().direction(), SortDirection::Descending);
        assert_eq!(SortSpec::parse("price").unwrap().direction(), SortDirection::Descending);
    }

    #[test]
    fn accepts_nested_field_paths() {
        let spec = SortSpec::parse("details.weight_kg:1").unwrap();
        assert_eq!(spec.field(), "details.weight_kg");
    }

    #[test]
    fn rejects_fields_that_are_not_identifiers() {
        for raw in [":1", "1price:1", "price;DELETE toys:1", "a..b:1", "pri ce:-1", "`x`:1"] {
            assert!(
                matches!(SortSpec::parse(raw), Err(StoreError::InvalidSort { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_params_are_ignored() {
        let query = ListQuery::from_params(Some(""), Some("")).unwrap();
        assert_eq!(query, ListQuery::all());
    }

    #[test]
    fn params_build_filter_and_sort() {
        let query = ListQuery::from_params(Some("a@x.com"), Some("price:1")).unwrap();
        assert_eq!(query.email.as_deref(), Some("a@x.com"));
        assert_eq!(
            query.sort,
            Some(SortSpec::new("price", SortDirection::Ascending).unwrap())
        );
    }
}
