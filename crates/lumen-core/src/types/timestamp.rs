// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Milliseconds in one day.
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// A point in time as milliseconds since the Unix epoch. This is the shape
/// the persisted snapshot has always used, so it serializes as a bare number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    /// The current time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// This timestamp shifted forward by a whole number of days.
    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0 + days * DAY_MILLIS)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Serde adapter for optional timestamps stored as `0` when unset.
pub mod zero_unset {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use super::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(ts.map(Timestamp::millis).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let millis: Option<i64> = Option::deserialize(d)?;
        Ok(millis.filter(|m| *m > 0).map(Timestamp::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_days() {
        let ts = Timestamp::from_millis(1_000);
        assert_eq!(ts.plus_days(3).millis(), 1_000 + 3 * DAY_MILLIS);
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::from_millis(1_696_516_215_123);
        assert_eq!(ts.to_string(), "2023-10-05 14:30");
    }

    #[test]
    fn test_serialize_as_number() {
        let ts = Timestamp::from_millis(1234);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1234");
        let back: Timestamp = serde_json::from_str("1234").unwrap();
        assert_eq!(back, ts);
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        #[serde(with = "zero_unset", default)]
        at: Option<Timestamp>,
    }

    #[test]
    fn test_zero_unset() {
        let unset = Holder { at: None };
        assert_eq!(serde_json::to_string(&unset).unwrap(), r#"{"at":0}"#);
        let parsed: Holder = serde_json::from_str(r#"{"at":0}"#).unwrap();
        assert_eq!(parsed, unset);
        let parsed: Holder = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert_eq!(parsed, unset);
        let parsed: Holder = serde_json::from_str(r#"{"at":55}"#).unwrap();
        assert_eq!(parsed.at, Some(Timestamp::from_millis(55)));
    }
}
