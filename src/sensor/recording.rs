//! Persistence of accepted sensor lines for record/replay.

use std::path::Path;

use crate::sensor::csv::{parse_frame, FrameError};

/// An ordered log of accepted raw CSV lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    lines: Vec<String>,
}

impl Recording {
    /// An empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one accepted raw line (without its line terminator).
    pub fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    /// The recorded lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write the log to a file, one frame per line.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut content = self.lines.join("\n");
        content.push('\n');
        std::fs::write(path, content)
    }

    /// Read a previously saved log.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let lines = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self { lines })
    }

    /// Transpose the recording into `count` per-sensor columns.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if any recorded line holds fewer than
    /// `count` readings or a non-numeric field.
    pub fn columns(&self, count: usize) -> Result<Vec<Vec<f32>>, FrameError> {
        let mut columns = vec![Vec::with_capacity(self.lines.len()); count];
        for line in &self.lines {
            let values = parse_frame(line, count)?;
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_transpose_recorded_frames() {
        let mut recording = Recording::new();
        recording.push_line("1,10,100");
        recording.push_line("2,20,200");
        recording.push_line("3,30,300");

        let columns = recording.columns(2).unwrap();
        assert_eq!(columns, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);
    }

    #[test]
    fn columns_surface_garbage_lines() {
        let mut recording = Recording::new();
        recording.push_line("1,2");
        recording.push_line("oops");
        assert!(recording.columns(2).is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut recording = Recording::new();
        recording.push_line("5,6,7");
        recording.push_line("8,9,10");

        let path = std::env::temp_dir().join("somaviz_recording_test.txt");
        recording.save(&path).unwrap();
        let loaded = Recording::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, recording);
    }
}
