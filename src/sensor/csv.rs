//! CSV sensor-frame parsing.
//!
//! A frame is one line of comma-separated readings, e.g.
//! `512,380,1023,...`. Hardware occasionally emits garbage (partial
//! lines after a reset, non-numeric noise); those lines are rejected
//! with a typed error so the reader can log and skip them without
//! corrupting the stream.

use std::fmt;
use std::io::BufRead;

use crate::sensor::recording::Recording;

/// Why a line failed to parse as a sensor frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The line held fewer comma-separated values than expected.
    TooFewValues {
        /// How many readings a frame must carry.
        expected: usize,
        /// How many the line actually held.
        actual: usize,
    },
    /// A field could not be parsed as a float.
    InvalidNumber(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewValues { expected, actual } => write!(
                f,
                "frame has {actual} values, expected at least {expected}"
            ),
            Self::InvalidNumber(field) => {
                write!(f, "value {field:?} is not a number")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Parse one CSV line into the first `count` readings.
///
/// Every field on the line must parse as a float (a single corrupted
/// field marks the whole line as garbage), but only the first `count`
/// readings are returned - hardware may send more sensors than the
/// visualization consumes.
///
/// # Errors
///
/// Returns [`FrameError`] on a short or non-numeric line.
pub fn parse_frame(line: &str, count: usize) -> Result<Vec<f32>, FrameError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < count {
        return Err(FrameError::TooFewValues {
            expected: count,
            actual: fields.len(),
        });
    }
    let mut values = Vec::with_capacity(fields.len());
    for field in &fields {
        match field.trim().parse::<f32>() {
            Ok(value) => values.push(value),
            Err(_) => {
                return Err(FrameError::InvalidNumber((*field).to_owned()));
            }
        }
    }
    values.truncate(count);
    Ok(values)
}

/// Pulls validated frames from a buffered line source, keeping every
/// accepted raw line for later persistence.
pub struct SensorReader<R> {
    reader: R,
    count: usize,
    recording: Recording,
}

impl<R: BufRead> SensorReader<R> {
    /// Reader expecting `count` readings per line.
    pub fn new(reader: R, count: usize) -> Self {
        Self {
            reader,
            count,
            recording: Recording::new(),
        }
    }

    /// Read until the next valid frame. Garbage lines are warned about
    /// and skipped; `Ok(None)` means the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading a line fails.
    pub fn next_frame(&mut self) -> std::io::Result<Option<Vec<f32>>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match parse_frame(&line, self.count) {
                Ok(values) => {
                    self.recording.push_line(line.trim());
                    return Ok(Some(values));
                }
                Err(e) => {
                    log::warn!(
                        "skipping garbage frame {:?}: {e}",
                        line.trim(),
                    );
                }
            }
        }
    }

    /// Every accepted raw line so far.
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Consume the reader, keeping the accepted-line log.
    pub fn into_recording(self) -> Recording {
        self.recording
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn valid_line_yields_the_first_count_readings() {
        let values = parse_frame("1,2,3,4,5,6,7,8\r\n", 3).unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn short_line_is_rejected() {
        assert_eq!(
            parse_frame("1,2", 3),
            Err(FrameError::TooFewValues {
                expected: 3,
                actual: 2,
            }),
        );
    }

    #[test]
    fn non_numeric_field_rejects_the_whole_line() {
        // Even a corrupted field past the consumed prefix marks the
        // line as garbage.
        assert_eq!(
            parse_frame("1,2,3,x", 3),
            Err(FrameError::InvalidNumber("x".into())),
        );
    }

    #[test]
    fn reader_skips_garbage_and_records_accepted_lines() {
        let input = "1,2,3\ngarbage\n4,5,6\n";
        let mut reader = SensorReader::new(Cursor::new(input), 3);

        assert_eq!(
            reader.next_frame().unwrap(),
            Some(vec![1.0, 2.0, 3.0]),
        );
        assert_eq!(
            reader.next_frame().unwrap(),
            Some(vec![4.0, 5.0, 6.0]),
        );
        assert_eq!(reader.next_frame().unwrap(), None);

        let recording = reader.into_recording();
        assert_eq!(recording.lines(), ["1,2,3", "4,5,6"]);
    }
}
