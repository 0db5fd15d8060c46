use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::text_utils::parse_date_time;

/// Post date as sent by the API (`2013-06-17 19:04:30 GMT`) or as RFC 3339.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ApiDate(pub DateTime<Utc>);

impl<'de> Deserialize<'de> for ApiDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let value = String::deserialize(deserializer)?;
        let date = ApiDate::from_str(&value).map_err(Error::custom)?;
        Ok(date)
    }
}

impl FromStr for ApiDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(date_time.with_timezone(&Utc)));
        }
        let date_time = parse_date_time(s)?;
        Ok(Self(date_time))
    }
}
