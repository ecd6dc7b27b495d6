// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device clock readings.
//!
//! Recorders report their local time in several shapes depending on vendor
//! and firmware. All of them embed a `YYYY-MM-DD[ T]HH:MM:SS` run somewhere in
//! the text, sometimes followed by fractional seconds or a timezone suffix.
//! This module finds that run and normalizes it.
//!
//! # Supported Inputs
//!
//! - `"2024-01-05T14:30:00"`
//! - `"2024-01-05 14:30:00"`
//! - `"2024-01-05T14:30:00.123+01:00"`
//! - `"result=2024-01-05 14:30:00\r\n"`
//!
//! The timezone suffix is dropped: the reading is the device's wall clock.
//!
//! # Examples
//!
//! ```
//! use dvr_monitor::types::DeviceTime;
//!
//! let time = DeviceTime::find("2024-01-05T14:30:00-03:00").unwrap();
//! assert_eq!(time.iso(), "2024-01-05T14:30:00");
//! assert_eq!(time.display(), "05-01-2024 14:30:00");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

/// Length of `YYYY-MM-DD HH:MM:SS`.
const STAMP_LEN: usize = 19;

/// Error returned when no datetime could be found in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTimeParseError {
    input: String,
}

impl DeviceTimeParseError {
    /// Returns the input string that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for DeviceTimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no YYYY-MM-DD HH:MM:SS datetime found in '{}'",
            self.input
        )
    }
}

impl std::error::Error for DeviceTimeParseError {}

/// A wall-clock reading taken from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeviceTime {
    naive: NaiveDateTime,
}

impl DeviceTime {
    /// Finds the first recognizable datetime in `text`.
    #[must_use]
    pub fn find(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() < STAMP_LEN {
            return None;
        }
        (0..=bytes.len() - STAMP_LEN).find_map(|start| {
            let window = &bytes[start..start + STAMP_LEN];
            if !has_stamp_shape(window) {
                return None;
            }
            // The window is pure ASCII, so these are char boundaries.
            let candidate = text.get(start..start + STAMP_LEN)?;
            let date = &candidate[..10];
            let time = &candidate[11..];
            NaiveDateTime::parse_from_str(&format!("{date}T{time}"), "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| Self { naive })
        })
    }

    /// Returns the underlying naive datetime.
    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        self.naive
    }

    /// ISO 8601 rendering without fraction or offset: `2024-01-05T14:30:00`.
    #[must_use]
    pub fn iso(&self) -> String {
        self.naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Day-first rendering used for display: `05-01-2024 14:30:00`.
    #[must_use]
    pub fn display(&self) -> String {
        self.naive.format("%d-%m-%Y %H:%M:%S").to_string()
    }
}

impl FromStr for DeviceTime {
    type Err = DeviceTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::find(s).ok_or_else(|| DeviceTimeParseError {
            input: s.to_string(),
        })
    }
}

impl From<NaiveDateTime> for DeviceTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self { naive }
    }
}

fn has_stamp_shape(w: &[u8]) -> bool {
    const DIGITS: [usize; 14] = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18];
    DIGITS.iter().all(|&i| w[i].is_ascii_digit())
        && w[4] == b'-'
        && w[7] == b'-'
        && (w[10] == b' ' || w[10] == b'T')
        && w[13] == b':'
        && w[16] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_suffix_is_dropped() {
        let time: DeviceTime = "2024-01-05T14:30:00-03:00".parse().unwrap();
        assert_eq!(time.iso(), "2024-01-05T14:30:00");
    }

    #[test]
    fn space_separator() {
        let time: DeviceTime = "2024-01-05 14:30:00".parse().unwrap();
        assert_eq!(time.iso(), "2024-01-05T14:30:00");
    }

    #[test]
    fn fractional_seconds_tolerated() {
        let time = DeviceTime::find("2024-01-05T14:30:00.250Z").unwrap();
        assert_eq!(time.iso(), "2024-01-05T14:30:00");
    }

    #[test]
    fn embedded_in_dump() {
        let time = DeviceTime::find("result=2024-12-31 23:59:58\r\n").unwrap();
        assert_eq!(time.display(), "31-12-2024 23:59:58");
    }

    #[test]
    fn invalid_calendar_date_is_skipped() {
        // First run has month 13; the second run is valid.
        let time = DeviceTime::find("2024-13-01 00:00:00 / 2024-02-29 10:00:00").unwrap();
        assert_eq!(time.iso(), "2024-02-29T10:00:00");
    }

    #[test]
    fn non_ascii_prefix() {
        let time = DeviceTime::find("horário: 2024-01-05 14:30:00").unwrap();
        assert_eq!(time.iso(), "2024-01-05T14:30:00");
    }

    #[test]
    fn no_match() {
        assert!(DeviceTime::find("14:30:00").is_none());
        let err = "garbage".parse::<DeviceTime>().unwrap_err();
        assert_eq!(err.input(), "garbage");
    }
}
