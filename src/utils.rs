/// Generates the actix handler for every `<name>_impl` function. The handler answers
/// with the given success status, or with the error's own status and the error envelope.
#[macro_export]
macro_rules! api_funcs {
    ( $( ( $method:ident, $func_name:ident, $url:literal, ( $( $arg:ident : $arg_ty:ty ),* $(,)? ), $response:ty, $ok:ident ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[$method($url)]
                async fn $func_name( $( $arg: $arg_ty ),* ) -> impl Responder {
                    match [<$func_name _impl>]( $( $arg ),* ).await {
                        Ok(response) => HttpResponse::$ok().json(response),
                        Err(err) => $crate::protocol::error_response(&err, <$response>::err(&err)),
                    }
                }
            }
        )+
    };
}

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub fn parse_date_str<S: AsRef<str>>(s: S) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.as_ref().trim(), "%Y-%m-%d").context("Wrong date format (expected YYYY-MM-DD)")
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_clock_str<S: AsRef<str>>(s: S) -> anyhow::Result<NaiveTime> {
    let s = s.as_ref().trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("Invalid time of day '{}'", s))
}

pub fn parse_date_str_opt<S: AsRef<str>>(date: Option<S>) -> anyhow::Result<Option<NaiveDate>> {
    date.map(parse_date_str).transpose()
}

/// 12-hour clock, e.g. `09:30 AM`.
pub fn format_clock(time: &NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

pub fn format_clock_span(start_time: &NaiveTime, end_time: &NaiveTime) -> String {
    format!("{} - {}", format_clock(start_time), format_clock(end_time))
}

/// e.g. `Monday, March 03, 2025`.
pub fn format_long_date(date: &NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

pub fn format_date_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time_str(time: &NaiveDateTime) -> String {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(TIME_FMT))
}
