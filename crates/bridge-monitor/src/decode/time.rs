//! Timestamp rendering
//!
//! Both the capture timestamp mark records (`NLMSG_TSTAMP`) and the
//! `--timestamp` prefix print times in `asctime(3)` layout, e.g.
//! `Thu Jan  1 00:00:00 1970`.

use crate::error::{MonitorError, Result};
use byteorder::{ByteOrder, NativeEndian};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// asctime(3) layout without the trailing newline
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub fn asctime<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(ASCTIME_FORMAT).to_string()
}

/// Render a mark record body (seconds, microseconds) in zone `tz`
pub fn render_mark_in<Tz>(tz: &Tz, payload: &[u8], out: &mut String) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if payload.len() < 8 {
        return Err(MonitorError::Decode(format!(
            "timestamp mark needs 8 bytes, got {}",
            payload.len()
        )));
    }
    let secs = NativeEndian::read_u32(&payload[0..4]);
    let usecs = NativeEndian::read_u32(&payload[4..8]);

    let when = DateTime::from_timestamp(i64::from(secs), 0)
        .map(|utc| asctime(&utc.with_timezone(tz)))
        .unwrap_or_else(|| secs.to_string());
    out.push_str(&format!("Timestamp: {} {} us\n", when, usecs));
    Ok(())
}

/// Render a mark record body in local time
pub fn render_mark(payload: &[u8], out: &mut String) -> Result<()> {
    render_mark_in(&Local, payload, out)
}

/// Wall-clock line written ahead of each record when timestamps are on
pub fn capture_line_at<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "Timestamp: {} {} usec\n",
        asctime(now),
        now.timestamp_subsec_micros()
    )
}

pub fn capture_line() -> String {
    capture_line_at(&Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mark(secs: u32, usecs: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 8];
        NativeEndian::write_u32(&mut payload[0..4], secs);
        NativeEndian::write_u32(&mut payload[4..8], usecs);
        payload
    }

    #[test]
    fn test_epoch_mark() {
        let mut out = String::new();
        render_mark_in(&Utc, &mark(0, 500_000), &mut out).unwrap();
        assert_eq!(out, "Timestamp: Thu Jan  1 00:00:00 1970 500000 us\n");
    }

    #[test]
    fn test_two_digit_day() {
        let mut out = String::new();
        // 2009-02-13 23:31:30 UTC
        render_mark_in(&Utc, &mark(1_234_567_890, 7), &mut out).unwrap();
        assert_eq!(out, "Timestamp: Fri Feb 13 23:31:30 2009 7 us\n");
    }

    #[test]
    fn test_local_mark_keeps_microseconds() {
        let mut out = String::new();
        render_mark(&mark(0, 500_000), &mut out).unwrap();
        assert!(out.starts_with("Timestamp: "));
        assert!(out.ends_with(" 500000 us\n"));
    }

    #[test]
    fn test_short_mark_is_decode_error() {
        let mut out = String::new();
        let err = render_mark_in(&Utc, &[0u8; 4], &mut out).unwrap_err();
        assert!(matches!(err, MonitorError::Decode(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_capture_line_layout() {
        let now = Utc.timestamp_opt(0, 1_500_000).unwrap();
        assert_eq!(
            capture_line_at(&now),
            "Timestamp: Thu Jan  1 00:00:00 1970 1500 usec\n"
        );
    }
}
