use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::sales::DashboardFilter;

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 6, max = 256))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadQuery {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_date_range"))]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Comma-separated `ship-state` values
    pub state: Option<String>,
}

fn validate_date_range(query: &DashboardQuery) -> Result<(), ValidationError> {
    match (query.start, query.end) {
        (Some(start), Some(end)) if start > end => {
            Err(ValidationError::new("start_after_end"))
        }
        _ => Ok(()),
    }
}

impl From<DashboardQuery> for DashboardFilter {
    fn from(query: DashboardQuery) -> Self {
        let states = query
            .state
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            start: query.start,
            end: query.end,
            states,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PartQuery {
    #[validate(range(min = 1))]
    pub rows: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        let ok = CredentialsRequest {
            username: "analyst".to_string(),
            password: "secret-pw".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short = CredentialsRequest {
            username: "ab".to_string(),
            password: "123".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_dashboard_query_to_filter() {
        let query = DashboardQuery {
            start: NaiveDate::from_ymd_opt(2022, 4, 1),
            end: NaiveDate::from_ymd_opt(2022, 4, 30),
            state: Some("GOA, KERALA,,".to_string()),
        };
        assert!(query.validate().is_ok());

        let filter = DashboardFilter::from(query);
        assert_eq!(filter.states, vec!["GOA", "KERALA"]);
    }

    #[test]
    fn test_reversed_date_range_rejected() {
        let query = DashboardQuery {
            start: NaiveDate::from_ymd_opt(2022, 5, 1),
            end: NaiveDate::from_ymd_opt(2022, 4, 1),
            state: None,
        };
        assert!(query.validate().is_err());
    }
}
