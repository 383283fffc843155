//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use parley_core::repository::SortOrder;
use parley_core::repository::feedback::FeedbackFilter;
use parley_core::repository::user::UserFilter;
use parley_core::service::feedback::DEFAULT_TREND_DAYS;
use parley_types::feedback::FeedbackOrigin;
use parley_types::user::normalize_phone;

use crate::http::error::AppError;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// Page number (1-based) and page size.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize, Default)]
pub struct UserListQuery {
    pub search: Option<String>,
    /// Sort order on creation time (asc, desc).
    #[serde(default = "default_order")]
    pub order: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_order() -> String {
    "desc".to_string()
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, limit: self.limit }
    }

    pub fn to_filter(&self) -> UserFilter {
        let pagination = self.pagination();
        let sort_order = match self.order.to_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        UserFilter {
            search: self.search.clone(),
            sort_order: Some(sort_order),
            limit: Some(i64::from(pagination.limit())),
            offset: Some(pagination.offset()),
        }
    }
}

/// Query parameters for `GET /feedback`.
#[derive(Debug, Deserialize, Default)]
pub struct FeedbackListQuery {
    pub phone_number: Option<String>,
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    /// `user` or `auto`.
    pub origin: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FeedbackListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, limit: self.limit }
    }

    pub fn to_filter(&self) -> Result<FeedbackFilter, AppError> {
        let pagination = self.pagination();
        let origin = self
            .origin
            .as_deref()
            .map(str::parse::<FeedbackOrigin>)
            .transpose()
            .map_err(AppError::Validation)?;

        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(AppError::Validation(format!(
                    "min_rating ({min}) is greater than max_rating ({max})"
                )));
            }
        }

        Ok(FeedbackFilter {
            phone_number: self.phone_number.as_deref().map(normalize_phone),
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            origin,
            limit: Some(i64::from(pagination.limit())),
            offset: Some(pagination.offset()),
        })
    }
}

/// Query parameters for `GET /feedback/trend`.
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_trend_days")]
    pub days: u32,
}

fn default_trend_days() -> u32 {
    DEFAULT_TREND_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        let p = Pagination::default();
        assert_eq!((p.page(), p.limit(), p.offset()), (1, 20, 0));

        let p = Pagination { page: Some(3), limit: Some(500) };
        assert_eq!((p.limit(), p.offset()), (100, 200));

        let p = Pagination { page: Some(0), limit: Some(0) };
        assert_eq!((p.page(), p.limit(), p.offset()), (1, 1, 0));
    }

    #[test]
    fn user_query_to_filter() {
        let query = UserListQuery {
            search: Some("sarah".to_string()),
            order: "ASC".to_string(),
            page: Some(2),
            limit: Some(10),
        };
        let filter = query.to_filter();
        assert_eq!(filter.sort_order, Some(SortOrder::Asc));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, Some(10));
    }

    #[test]
    fn feedback_query_normalizes_phone_and_origin() {
        let query = FeedbackListQuery {
            phone_number: Some("628123456789".to_string()),
            origin: Some("auto".to_string()),
            ..Default::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.phone_number.as_deref(), Some("+628123456789"));
        assert_eq!(filter.origin, Some(FeedbackOrigin::Auto));
    }

    #[test]
    fn feedback_query_rejects_bad_input() {
        let bad_origin = FeedbackListQuery {
            origin: Some("robot".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_origin.to_filter(), Err(AppError::Validation(_))));

        let inverted = FeedbackListQuery {
            min_rating: Some(5),
            max_rating: Some(2),
            ..Default::default()
        };
        assert!(matches!(inverted.to_filter(), Err(AppError::Validation(_))));
    }
}
