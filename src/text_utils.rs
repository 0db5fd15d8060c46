use std::ops::Index;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_TIME_REGEX: Regex = Regex::new(
        r"^\s*(\d{4})-(\d{1,2})-(\d{1,2})[ T](\d{1,2}):(\d{1,2}):(\d{1,2})(\.\d{1,9})?\s*(GMT|UTC|Z)?\s*$"
    ).unwrap();

    // Delimiters ending the first phrase of a summary or text block
    static ref PHRASE_SEPARATORS: Regex = Regex::new(r#"[,.!?;:\t<\[\n\r"“]"#).unwrap();
}

fn to_int<T: std::str::FromStr>(num_str: &str, date_str: &str) -> Result<T, String> {
    match num_str.parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => Err(format!("Error parsing {} from the date {}", num_str, date_str)),
    }
}

/// Parses `2013-06-17 19:04:30 GMT`, with optional fraction and zone. A missing zone is taken as UTC.
pub fn parse_date_time(buf: &str) -> Result<DateTime<Utc>, String> {
    let Some(caps) = DATE_TIME_REGEX.captures(buf) else {
        return Err(format!("Unable to parse date time {}", buf));
    };

    let to_i32 = |num_str: &str| to_int::<i32>(num_str, buf);
    let to_u32 = |num_str: &str| to_int::<u32>(num_str, buf);

    let y: i32 = to_i32(caps.index(1))?;
    let m: u32 = to_u32(caps.index(2))?;
    let d: u32 = to_u32(caps.index(3))?;
    let h: u32 = to_u32(caps.index(4))?;
    let mn: u32 = to_u32(caps.index(5))?;
    let s: u32 = to_u32(caps.index(6))?;
    let nanos: u32 = match caps.get(7) {
        Some(frac) => {
            // ".5" is 500ms, pad to nanoseconds
            let digits = &frac.as_str()[1..];
            to_u32(&format!("{:0<9}", digits))?
        }
        None => 0,
    };

    let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
        return Err(format!("Invalid date in {}", buf));
    };
    let Some(time) = NaiveTime::from_hms_nano_opt(h, mn, s, nanos) else {
        return Err(format!("Invalid time in {}", buf));
    };

    Ok(NaiveDateTime::new(date, time).and_utc())
}

/// Accepts RFC 3339, the API date format, or a plain `YYYY-MM-DD` (midnight UTC).
pub fn parse_since(buf: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(buf.trim()) {
        return Ok(date_time.with_timezone(&Utc));
    }
    if let Ok(date_time) = parse_date_time(buf) {
        return Ok(date_time);
    }
    match NaiveDate::parse_from_str(buf.trim(), "%Y-%m-%d") {
        Ok(date) => Ok(date.and_time(NaiveTime::MIN).and_utc()),
        Err(_) => Err(format!("Unable to parse date {}, expected YYYY-MM-DD or RFC 3339", buf)),
    }
}

pub fn format_date_time(date_time: &DateTime<Utc>) -> String {
    date_time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// First phrase of a piece of text, used to make up a title for posts that have none.
pub fn first_text_phrase(input: &str) -> Option<&str> {
    if input.chars().count() <= 1 {
        return None;
    }

    let input = input.trim_matches(|c| c == '"' || c == '\'');
    PHRASE_SEPARATORS.split(input)
        .find(|fragment| !fragment.is_empty())
}

/// Extension of the file a URL points to, ignoring query string and fragment.
pub fn file_type(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

pub fn escape_yaml(input: &str) -> String {
    input.replace('\\', "\\\\")
}

pub fn is_blank(input: Option<&str>) -> bool {
    input.map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_date_time() {
        let date_time = parse_date_time("2013-06-17 19:04:30 GMT").unwrap();
        assert_eq!(format_date_time(&date_time), "2013-06-17T19:04:30Z");

        let date_time = parse_date_time("2017-09-10 10:42:32.123").unwrap();
        assert_eq!(date_time.year(), 2017);
        assert_eq!(date_time.nanosecond(), 123_000_000);
        assert_eq!(format_date_time(&date_time), "2017-09-10T10:42:32Z");

        assert!(parse_date_time("2017-13-10 10:42:32").is_err());
        assert!(parse_date_time("yesterday").is_err());
    }

    #[test]
    fn test_parse_since() {
        let since = parse_since("2020-01-02").unwrap();
        assert_eq!(format_date_time(&since), "2020-01-02T00:00:00Z");

        let since = parse_since("2020-01-02T10:00:00+02:00").unwrap();
        assert_eq!(format_date_time(&since), "2020-01-02T08:00:00Z");

        let since = parse_since("2020-01-02 10:00:00 GMT").unwrap();
        assert_eq!(format_date_time(&since), "2020-01-02T10:00:00Z");

        assert!(parse_since("02/01/2020").is_err());
    }

    #[test]
    fn test_first_text_phrase() {
        assert_eq!(first_text_phrase("Quick thought. More text."), Some("Quick thought"));
        assert_eq!(first_text_phrase("Hello, world!"), Some("Hello"));
        assert_eq!(first_text_phrase("\"Quoted\" text"), Some("Quoted"));
        assert_eq!(first_text_phrase("...and then"), Some("and then"));
        assert_eq!(first_text_phrase("line one\nline two"), Some("line one"));
        assert_eq!(first_text_phrase("see [link]"), Some("see "));
        assert_eq!(first_text_phrase("x"), None);
        assert_eq!(first_text_phrase(""), None);
        assert_eq!(first_text_phrase("?!."), None);
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("https://64.media.tumblr.com/abc/tumblr_xyz_1280.jpg"), Some("jpg"));
        assert_eq!(file_type("https://va.media.tumblr.com/tumblr_xyz.mp4?x=1.2#t=3.4"), Some("mp4"));
        assert_eq!(file_type("https://64.media.tumblr.com/abc/tumblr_xyz"), None);
    }

    #[test]
    fn test_escape_yaml() {
        assert_eq!(escape_yaml(r"C:\temp"), r"C:\\temp");
        assert_eq!(escape_yaml("plain"), "plain");
    }
}
