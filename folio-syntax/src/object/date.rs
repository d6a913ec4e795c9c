//! Date strings.

use crate::reader::Reader;
use std::str::FromStr;

/// A date time, as stored in PDF date strings (`D:YYYYMMDDHHmmSSOHH'mm`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DateTime {
    /// The year.
    pub year: u16,
    /// The month.
    pub month: u8,
    /// The day.
    pub day: u8,
    /// The hour.
    pub hour: u8,
    /// The minute.
    pub minute: u8,
    /// The second.
    pub second: u8,
    /// The signed offset from UTC, in minutes.
    pub utc_offset_minutes: i16,
}

impl DateTime {
    /// Create a new UTC date time.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            utc_offset_minutes: 0,
        }
    }

    /// Attach a UTC offset to the date, given as signed minutes east of UTC.
    pub fn with_utc_offset(mut self, minutes: i16) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Parse a date string.
    ///
    /// Parsing is lenient: all fields except for the year are optional, and the `D:` prefix
    /// may be missing.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut reader = Reader::new(bytes);

        reader.forward_tag(b"D:");

        let read_num = |reader: &mut Reader<'_>, bytes: u8, min: u16, max: u16| -> Option<u16> {
            if matches!(reader.peek_byte()?, b'-' | b'+' | b'Z') {
                return None;
            }

            let num = u16::from_str(std::str::from_utf8(reader.read_bytes(bytes as usize)?).ok()?)
                .ok()?;

            if num < min || num > max {
                return None;
            }

            Some(num)
        };

        let year = read_num(&mut reader, 4, 0, 9999)?;
        let month = read_num(&mut reader, 2, 1, 12)
            .map(|n| n as u8)
            .unwrap_or(1);
        let day = read_num(&mut reader, 2, 1, 31)
            .map(|n| n as u8)
            .unwrap_or(1);
        let hour = read_num(&mut reader, 2, 0, 23)
            .map(|n| n as u8)
            .unwrap_or(0);
        let minute = read_num(&mut reader, 2, 0, 59)
            .map(|n| n as u8)
            .unwrap_or(0);
        let second = read_num(&mut reader, 2, 0, 59)
            .map(|n| n as u8)
            .unwrap_or(0);

        let utc_offset_minutes = if !reader.at_end() {
            let multiplier = match reader.read_byte()? {
                b'-' => -1,
                _ => 1,
            };

            let hour = read_num(&mut reader, 2, 0, 23).unwrap_or(0) as i16;
            reader.forward_tag(b"\'");
            let minute = read_num(&mut reader, 2, 0, 59).unwrap_or(0) as i16;

            multiplier * (hour * 60 + minute)
        } else {
            0
        };

        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            utc_offset_minutes,
        })
    }

    /// Format the date as a PDF date string.
    ///
    /// A zero offset is written as `Z00'00`.
    pub fn to_pdf_string(&self) -> String {
        let offset = if self.utc_offset_minutes == 0 {
            "Z00'00".to_string()
        } else {
            let sign = if self.utc_offset_minutes < 0 { '-' } else { '+' };
            let abs = self.utc_offset_minutes.unsigned_abs();

            format!("{sign}{:02}'{:02}", abs / 60, abs % 60)
        };

        format!(
            "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
