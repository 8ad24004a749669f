//! Page-number pagination with absolute `next`/`previous` links.

use crate::error::AppError;

pub const INVALID_PAGE: &str = "Invalid page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
    pub count: i64,
}

impl Page {
    /// Validates the raw `page` parameter against the total row count. An
    /// empty result set still has a first page.
    pub fn resolve(raw: Option<&str>, size: i64, count: i64) -> Result<Self, AppError> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| AppError::NotFound(INVALID_PAGE.to_string()))?,
        };
        let page = Page { number, size, count };
        if number < 1 || number > page.last() {
            return Err(AppError::NotFound(INVALID_PAGE.to_string()));
        }
        Ok(page)
    }

    pub fn last(&self) -> i64 {
        ((self.count + self.size - 1) / self.size).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    pub fn next(&self) -> Option<i64> {
        (self.number < self.last()).then_some(self.number + 1)
    }

    pub fn previous(&self) -> Option<i64> {
        (self.number > 1).then_some(self.number - 1)
    }
}

/// Builds `{base}{path}?{params}&page=N`. The first page carries no `page`
/// parameter at all.
pub fn link(base_url: &str, path: &str, params: &[(&str, &str)], page: i64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}{path}?{query}")
    }
}
