//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size for history listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Upper bound for any `?limit=`.
pub const MAX_LIMIT: i64 = 100;

/// `?limit=` for newest-first history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    /// The requested limit clamped to `1..=MAX_LIMIT`, or `default`.
    pub fn resolve(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(LimitParams { limit: None }.resolve(DEFAULT_LIMIT), 50);
        assert_eq!(LimitParams { limit: Some(0) }.resolve(DEFAULT_LIMIT), 1);
        assert_eq!(LimitParams { limit: Some(500) }.resolve(DEFAULT_LIMIT), MAX_LIMIT);
        assert_eq!(LimitParams { limit: Some(7) }.resolve(DEFAULT_LIMIT), 7);
    }
}
