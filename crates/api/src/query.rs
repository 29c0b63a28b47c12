use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Gallery pagination (`?limit=&skip=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = PaginationParams {
            limit: Some(1000),
            skip: Some(-5),
        };
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
        assert_eq!(p.skip(), 0);
        assert_eq!(PaginationParams::default().limit(), DEFAULT_PAGE_SIZE);
    }
}
