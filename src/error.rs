use chrono::NaiveDate;
use thiserror::Error;

/// Invalid input data found while aggregating a snapshot.
///
/// Every variant aborts only the computation that hit it; callers decide
/// whether to surface a partial report or fail the whole request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("invalid input data: assessment component {component_id} has non-positive base {base}")]
    NonPositiveBase { component_id: i64, base: f64 },

    #[error("invalid input data: term {term_id} has invalid interval {start} .. {end}")]
    InvalidTermInterval {
        term_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid input data: {entity} {id} is referenced but missing from the snapshot")]
    MissingLink { entity: &'static str, id: i64 },

    #[error("invalid input data: terms {first} and {second} both start on {start}")]
    AmbiguousTermOrder {
        first: i64,
        second: i64,
        start: NaiveDate,
    },
}

impl RecordError {
    pub fn missing(entity: &'static str, id: i64) -> Self {
        RecordError::MissingLink { entity, id }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_invalid_input_kind() {
        let err = RecordError::missing("carrier", 42);
        assert_eq!(
            err.to_string(),
            "invalid input data: carrier 42 is referenced but missing from the snapshot"
        );

        let err = RecordError::NonPositiveBase {
            component_id: 7,
            base: 0.0,
        };
        assert!(err.to_string().starts_with("invalid input data"));
    }
}
