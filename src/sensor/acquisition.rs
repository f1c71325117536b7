//! Background sensor acquisition.
//!
//! One producer thread pulls frames from a [`SensorSource`] at a fixed
//! cadence and pushes each into the shared [`LatestSlot`]. The render
//! loop stays single-threaded; it only ever pops the newest snapshot.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SomavizError;
use crate::sensor::csv::SensorReader;
use crate::sensor::slot::LatestSlot;

/// A producer of sensor frames. `None` means the source is exhausted
/// and the acquisition thread should exit.
pub trait SensorSource: Send {
    /// Produce the next frame of readings.
    fn next_frame(&mut self) -> Option<Vec<f32>>;
}

impl SensorSource for Box<dyn SensorSource> {
    fn next_frame(&mut self) -> Option<Vec<f32>> {
        self.as_mut().next_frame()
    }
}

/// Random readings in `[0, max_value)` - for running without hardware.
pub struct SimulatedSource {
    count: usize,
    max_value: f32,
    rng: StdRng,
}

impl SimulatedSource {
    /// Simulated stream of `count` readings per frame.
    #[must_use]
    pub fn new(count: usize, max_value: f32) -> Self {
        Self {
            count,
            max_value,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl SensorSource for SimulatedSource {
    fn next_frame(&mut self) -> Option<Vec<f32>> {
        Some(
            (0..self.count)
                .map(|_| self.rng.random_range(0.0..self.max_value))
                .collect(),
        )
    }
}

/// Frames pulled from a buffered CSV line source (a replay file or a
/// port wrapper). Garbage lines are skipped by the inner reader; I/O
/// errors end the stream.
pub struct ReaderSource<R> {
    reader: SensorReader<R>,
}

impl<R: BufRead> ReaderSource<R> {
    /// Source expecting `count` readings per line.
    pub fn new(reader: R, count: usize) -> Self {
        Self {
            reader: SensorReader::new(reader, count),
        }
    }
}

impl<R: BufRead + Send> SensorSource for ReaderSource<R> {
    fn next_frame(&mut self) -> Option<Vec<f32>> {
        match self.reader.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("sensor source read failed: {e}");
                None
            }
        }
    }
}

/// Handle to the running acquisition thread.
///
/// Shutdown is normally process exit; [`stop`](Self::stop) exists for
/// the cases where the stream should end early (source exhaustion ends
/// it on its own).
pub struct Acquisition {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Acquisition {
    /// Spawn the producer thread: one frame per `interval`, pushed
    /// into `slot` with overwrite semantics.
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::ThreadSpawn`] if the thread cannot be
    /// created.
    pub fn start(
        mut source: impl SensorSource + 'static,
        slot: Arc<LatestSlot<Vec<f32>>>,
        interval: Duration,
    ) -> Result<Self, SomavizError> {
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("sensor-acquisition".into())
            .spawn(move || {
                while running_flag.load(Ordering::Relaxed) {
                    let started = Instant::now();
                    match source.next_frame() {
                        Some(frame) => slot.push(frame),
                        None => {
                            log::info!("sensor source exhausted");
                            break;
                        }
                    }
                    if let Some(remaining) =
                        interval.checked_sub(started.elapsed())
                    {
                        std::thread::sleep(remaining);
                    }
                }
            })
            .map_err(SomavizError::ThreadSpawn)?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Ask the producer thread to exit after its current frame.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// `true` while the thread has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn simulated_source_respects_count_and_range() {
        let mut source = SimulatedSource::new(8, 100.0);
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.len(), 8);
        assert!(frame.iter().all(|&v| (0.0..100.0).contains(&v)));
    }

    #[test]
    fn reader_source_ends_at_eof() {
        let mut source =
            ReaderSource::new(Cursor::new("1,2\nbad\n3,4\n"), 2);
        assert_eq!(source.next_frame(), Some(vec![1.0, 2.0]));
        assert_eq!(source.next_frame(), Some(vec![3.0, 4.0]));
        assert_eq!(source.next_frame(), None);
    }

    #[test]
    fn acquisition_pushes_frames_until_stopped() {
        let slot = Arc::new(LatestSlot::new());
        let acquisition = Acquisition::start(
            SimulatedSource::new(3, 1.0),
            Arc::clone(&slot),
            Duration::from_millis(1),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let frame = loop {
            if let Some(frame) = slot.pop() {
                break frame;
            }
            assert!(Instant::now() < deadline, "no frame arrived");
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(frame.len(), 3);

        acquisition.stop();
        assert!(!acquisition.is_running());
    }
}
