//! Request types shared by list endpoints

/// Pagination query parameters
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based, default: 1)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page (default: 20, max: 100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationQuery {
    /// Page number, never below 1
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Get the limit (clamped to 1..=100)
    pub fn limit(&self) -> u32 {
        self.per_page.clamp(1, 100)
    }

    /// Get the offset for database queries
    pub fn offset(&self) -> u64 {
        (self.page() - 1) as u64 * self.limit() as u64
    }
}

/// Search + active filter used by the master-data list endpoints
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Case-insensitive match on code / name
    #[serde(default)]
    pub q: Option<String>,

    /// Omit to list only active records
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SearchQuery {
    /// Page parameters of this query
    ///
    /// Kept as plain fields rather than `#[serde(flatten)]` since flattened
    /// numbers do not deserialize from URL query strings.
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// `q` wrapped for `ILIKE`, `None` when blank
    pub fn pattern(&self) -> Option<String> {
        like_pattern(self.q.as_deref())
    }

    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            q: None,
            is_active: None,
        }
    }
}

/// Wrap a search term in `%...%`, escaping LIKE wildcards
pub fn like_pattern(q: Option<&str>) -> Option<String> {
    let q = q?.trim();
    if q.is_empty() {
        return None;
    }
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamp() {
        let q = PaginationQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 20);
        assert_eq!(q.offset(), 0);

        let q = PaginationQuery {
            page: 3,
            per_page: 500,
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 200);

        let q = PaginationQuery {
            page: 0,
            per_page: 0,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some(" acme ")), Some("%acme%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn test_search_query_from_json() {
        let q: SearchQuery =
            serde_json::from_str(r#"{"page":2,"per_page":5,"q":"box"}"#).unwrap();
        assert_eq!(q.pagination().offset(), 5);
        assert_eq!(q.pattern().as_deref(), Some("%box%"));
        assert!(q.active());

        let q: SearchQuery = serde_json::from_str(r#"{"is_active":false}"#).unwrap();
        assert_eq!(q.pagination().limit(), 20);
        assert!(!q.active());
    }
}
