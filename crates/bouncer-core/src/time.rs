//! Timestamp calls
//!
//! Timestamps travel as RFC 3339 strings and durations in the
//! `{seconds, nanos}` shape. Arithmetic that would leave the representable
//! timestamp range is an [`Error::OutOfRange`] failure.

use crate::error::{Error, Result};
use crate::types::{BallIn, BallOut, BounceGoodTimesRequest, BounceGoodTimesResponse, Duration};
use crate::transform::Bounce;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

impl Duration {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Convert to a chrono span; `None` when the seconds are out of range
    pub fn to_time_delta(self) -> Option<TimeDelta> {
        let seconds = TimeDelta::try_seconds(self.seconds)?;
        seconds.checked_add(&TimeDelta::nanoseconds(i64::from(self.nanos)))
    }

    /// Split a chrono span; `nanos` carries the sign of `seconds`
    pub fn from_time_delta(delta: TimeDelta) -> Self {
        Self {
            seconds: delta.num_seconds(),
            nanos: delta.subsec_nanos(),
        }
    }
}

/// `new_when = when + postponement`, `total_delay = new_when - now`
pub fn bounce_good_times(request: BounceGoodTimesRequest) -> Result<BounceGoodTimesResponse> {
    let postponement = request.postponement.to_time_delta().ok_or_else(|| Error::OutOfRange {
        message: format!(
            "postponement of {}s does not fit a duration",
            request.postponement.seconds
        ),
    })?;

    let new_when = request
        .when
        .checked_add_signed(postponement)
        .ok_or_else(|| Error::OutOfRange {
            message: format!(
                "{} postponed by {}s leaves the timestamp range",
                format_timestamp(&request.when),
                request.postponement.seconds
            ),
        })?;

    Ok(BounceGoodTimesResponse {
        now: request.now,
        new_when,
        total_delay: Duration::from_time_delta(new_when.signed_duration_since(request.now)),
    })
}

/// Greet the message and say how long ago `when` was, measured from `now`
pub fn bounce_it(ball: BallIn) -> BallOut {
    let ago = ball.now.signed_duration_since(ball.when);
    let time_message = format!(
        "{} was {} ago",
        format_timestamp(&ball.when),
        format_whole_seconds(ago.num_seconds())
    );

    BallOut {
        reply: ball.message.bounce(),
        time_message,
        now: ball.now,
    }
}

/// RFC 3339 to whole seconds with a `Z` suffix
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Hours, minutes and seconds with only the leading unit omitted when zero:
/// `1h2m3s`, `4m0s`, `5s`, `0s`, `-5s`
pub fn format_whole_seconds(total: i64) -> String {
    if total == 0 {
        return "0s".to_string();
    }

    let sign = if total < 0 { "-" } else { "" };
    let magnitude = total.unsigned_abs();
    let hours = magnitude / 3600;
    let minutes = (magnitude % 3600) / 60;
    let seconds = magnitude % 60;

    if hours > 0 {
        format!("{}{}h{}m{}s", sign, hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}{}m{}s", sign, minutes, seconds)
    } else {
        format!("{}{}s", sign, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_good_times_arithmetic() {
        let response = bounce_good_times(BounceGoodTimesRequest {
            now: at(1_000),
            when: at(1_500),
            postponement: Duration::new(60, 250_000_000),
        })
        .unwrap();

        assert_eq!(response.now, at(1_000));
        assert_eq!(
            response.new_when,
            at(1_560) + TimeDelta::milliseconds(250)
        );
        assert_eq!(response.total_delay, Duration::new(560, 250_000_000));
    }

    #[test]
    fn test_negative_total_delay() {
        let response = bounce_good_times(BounceGoodTimesRequest {
            now: at(100),
            when: at(0),
            postponement: Duration::new(10, 0),
        })
        .unwrap();
        assert_eq!(response.total_delay, Duration::new(-90, 0));
    }

    #[test]
    fn test_overflow_is_out_of_range() {
        let result = bounce_good_times(BounceGoodTimesRequest {
            now: at(0),
            when: DateTime::<Utc>::MAX_UTC,
            postponement: Duration::new(1, 0),
        });
        assert!(matches!(result, Err(Error::OutOfRange { .. })));

        let result = bounce_good_times(BounceGoodTimesRequest {
            now: at(0),
            when: at(0),
            postponement: Duration::new(i64::MAX, 0),
        });
        assert!(matches!(result, Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_whole_second_formatting() {
        assert_eq!(format_whole_seconds(0), "0s");
        assert_eq!(format_whole_seconds(5), "5s");
        assert_eq!(format_whole_seconds(-5), "-5s");
        assert_eq!(format_whole_seconds(240), "4m0s");
        assert_eq!(format_whole_seconds(3723), "1h2m3s");
        assert_eq!(format_whole_seconds(7200), "2h0m0s");
    }

    #[test]
    fn test_bounce_it_message() {
        let out = bounce_it(BallIn {
            message: "ball".to_string(),
            now: at(1_700_000_000) + TimeDelta::milliseconds(900),
            when: at(1_700_000_000 - 65),
        });
        assert_eq!(out.reply, "hello ball");
        assert_eq!(out.time_message, "2023-11-14T22:12:15Z was 1m5s ago");
        assert_eq!(out.now, at(1_700_000_000) + TimeDelta::milliseconds(900));
    }
}
