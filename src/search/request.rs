//! Search request parameters.

use crate::error::{KasaneError, Result};

/// Sort direction of one `sort_by` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Parse a `path:ASC` / `path:DESC` sort specification.
pub fn parse_sort(spec: &str) -> Result<(String, SortOrder)> {
    let Some((path, dir)) = spec.rsplit_once(':') else {
        return Err(KasaneError::invalid_request(format!(
            "Could not parse the sort clause: `{spec}`"
        )));
    };
    let order = match dir.trim() {
        d if d.eq_ignore_ascii_case("asc") => SortOrder::Asc,
        d if d.eq_ignore_ascii_case("desc") => SortOrder::Desc,
        other => {
            return Err(KasaneError::invalid_request(format!(
                "`{other}` is not a valid sort order"
            )));
        }
    };
    Ok((path.trim().to_string(), order))
}

/// A search request over one collection.
///
/// Constructed with the builder pattern:
///
/// ```
/// use kasane::search::SearchRequest;
///
/// let request = SearchRequest::new("one shoe")
///     .query_by(["locations.address.street", "employees.tags"])
///     .filter_by("locations.pincode:>= 100")
///     .highlight_full_fields("locations.address");
/// assert_eq!(request.query, "one shoe");
/// ```
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query string; `*` matches every document.
    pub query: String,
    /// Dotted paths (or object/object[] paths) to search in.
    pub query_by: Vec<String>,
    /// Optional filter expression (`path: value`, `&&`-joined).
    pub filter_by: Option<String>,
    /// `path:ASC|DESC` entries, applied in order.
    pub sort_by: Vec<String>,
    /// Paths to group results by.
    pub group_by: Vec<String>,
    /// Hits kept per group.
    pub group_limit: usize,
    /// Paths to include in returned documents (empty keeps everything).
    pub include_fields: Vec<String>,
    /// Paths to strip from returned documents.
    pub exclude_fields: Vec<String>,
    /// Comma-separated full-highlight field list.
    pub highlight_fields: Option<String>,
    /// Alternative spelling of [`Self::highlight_fields`]; wins when both
    /// are set.
    pub highlight_full_fields: Option<String>,
    /// Opening highlight marker.
    pub highlight_start_tag: String,
    /// Closing highlight marker.
    pub highlight_end_tag: String,
    /// Tokens of context kept on each side of a match when snipping.
    pub snippet_threshold: usize,
    /// Maximum hits returned (and groups, when grouping).
    pub limit: usize,
}

impl SearchRequest {
    /// Create a request with default parameters.
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            query_by: Vec::new(),
            filter_by: None,
            sort_by: Vec::new(),
            group_by: Vec::new(),
            group_limit: 3,
            include_fields: Vec::new(),
            exclude_fields: Vec::new(),
            highlight_fields: None,
            highlight_full_fields: None,
            highlight_start_tag: "<mark>".to_string(),
            highlight_end_tag: "</mark>".to_string(),
            snippet_threshold: 30,
            limit: 10,
        }
    }

    /// Set the fields to search in.
    pub fn query_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the filter expression.
    pub fn filter_by<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter_by = Some(filter.into());
        self
    }

    /// Set the sort clauses.
    pub fn sort_by<I, S>(mut self, sorts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = sorts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the group-by paths.
    pub fn group_by<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of hits kept per group.
    pub fn group_limit(mut self, limit: usize) -> Self {
        self.group_limit = limit;
        self
    }

    /// Set the include-field projection.
    pub fn include_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exclude-field projection.
    pub fn exclude_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the comma-separated full-highlight field list.
    pub fn highlight_fields<S: Into<String>>(mut self, fields: S) -> Self {
        self.highlight_fields = Some(fields.into());
        self
    }

    /// Set the full-highlight field list under its alternative name.
    pub fn highlight_full_fields<S: Into<String>>(mut self, fields: S) -> Self {
        self.highlight_full_fields = Some(fields.into());
        self
    }

    /// Set the highlight markers.
    pub fn highlight_tags<S: Into<String>>(mut self, start: S, end: S) -> Self {
        self.highlight_start_tag = start.into();
        self.highlight_end_tag = end.into();
        self
    }

    /// Set the snippet threshold, in tokens.
    pub fn snippet_threshold(mut self, threshold: usize) -> Self {
        self.snippet_threshold = threshold;
        self
    }

    /// Set the maximum number of hits returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The effective full-highlight list, whichever spelling was used.
    pub fn full_highlight_list(&self) -> Option<&str> {
        self.highlight_full_fields
            .as_deref()
            .or(self.highlight_fields.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_sort("details.count:ASC").unwrap(),
            ("details.count".to_string(), SortOrder::Asc)
        );
        assert_eq!(
            parse_sort("company.num_employees: desc").unwrap(),
            ("company.num_employees".to_string(), SortOrder::Desc)
        );
        assert!(parse_sort("no-direction").is_err());
        assert!(parse_sort("x:sideways").is_err());
    }

    #[test]
    fn test_full_highlight_list_prefers_alternative_spelling() {
        let request = SearchRequest::new("q")
            .highlight_fields("a")
            .highlight_full_fields("b");
        assert_eq!(request.full_highlight_list(), Some("b"));

        let request = SearchRequest::new("q").highlight_fields("a");
        assert_eq!(request.full_highlight_list(), Some("a"));

        assert_eq!(SearchRequest::new("q").full_highlight_list(), None);
    }
}
