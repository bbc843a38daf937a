//! Formats stored timestamps for API responses.

use time::{
    OffsetDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::Error;

/// Date time format for activity feeds, e.g. "2025-01-31 18:04:05".
const ACTIVITY_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Format `date_time` as an RFC 3339 string, e.g. "2025-01-31T18:04:05.123Z".
pub fn format_rfc3339(date_time: OffsetDateTime) -> Result<String, Error> {
    date_time
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))
}

/// Format `date_time` to the second without an offset.
pub fn format_activity_time(date_time: OffsetDateTime) -> Result<String, Error> {
    date_time
        .format(ACTIVITY_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))
}

#[cfg(test)]
mod timestamp_tests {
    use time::{UtcOffset, macros::datetime};

    use super::{format_activity_time, format_rfc3339};

    #[test]
    fn rfc3339_keeps_offset() {
        let date_time = datetime!(2025-03-04 05:06:07).assume_offset(UtcOffset::UTC);

        assert_eq!(
            format_rfc3339(date_time),
            Ok("2025-03-04T05:06:07Z".to_owned())
        );
    }

    #[test]
    fn activity_time_pads_midnight() {
        let date_time = datetime!(2025-12-21 00:00:00.5).assume_offset(UtcOffset::UTC);

        assert_eq!(
            format_activity_time(date_time),
            Ok("2025-12-21 00:00:00".to_owned())
        );
    }
}
