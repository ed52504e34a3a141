use chrono::NaiveDate;

use super::{parse_iso_date, ValidationError, ValidationResult};

/// Inclusive date window for aggregate reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Both bounds or neither; a single bound is an error rather than silently ignored
pub fn validate_date_range(start: Option<&str>, end: Option<&str>) -> ValidationResult<Option<DateRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_iso_date("start_date", start)?;
            let end = parse_iso_date("end_date", end)?;
            if start > end {
                return Err(ValidationError::field("end_date", "end_date must not be before start_date"));
            }
            Ok(Some(DateRange { start, end }))
        }
        _ => Err(ValidationError::new("start_date and end_date must be provided together")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_needs_both_bounds() {
        assert_eq!(validate_date_range(None, None).unwrap(), None);
        assert!(validate_date_range(Some("2024-01-01"), None).is_err());

        let range = validate_date_range(Some("2024-01-01"), Some("2024-03-31")).unwrap().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let err = validate_date_range(Some("2024-04-01"), Some("2024-03-31")).unwrap_err();
        assert_eq!(err.message, "end_date must not be before start_date");
    }
}
