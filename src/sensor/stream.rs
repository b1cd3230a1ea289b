//! # Orientation Stream
//!
//! Reads head orientation as JSON Lines, one quaternion per line:
//!
//! ```text
//! {"x":0.0,"y":0.3826834,"z":0.0,"w":0.9238795}
//! ```
//!
//! The HMD runtime writes to a FIFO (or any readable path). Opening a FIFO and
//! reading from it both block, so a dedicated reader thread does both and
//! keeps only the newest sample. The thread is never joined: a stalled writer
//! cannot hold up shutdown. Readings older than the stale timeout are reported
//! as gaps so the control loop can hold the gimbal still instead of replaying
//! an old pose.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::OrientationSensor;
use crate::error::{Result, RigError};
use crate::gimbal::euler::extract_euler_angles;

/// Quaternions shorter than this cannot be normalized
const MIN_QUATERNION_NORM: f32 = 1.0e-6;

/// One line of the orientation stream.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QuaternionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl QuaternionSample {
    /// Normalize into an orientation, rejecting degenerate samples
    pub fn to_orientation(&self) -> Option<UnitQuaternion<f32>> {
        let components = [self.x, self.y, self.z, self.w];
        if !components.iter().all(|c| c.is_finite()) {
            return None;
        }
        Unit::try_new(Quaternion::new(self.w, self.x, self.y, self.z), MIN_QUATERNION_NORM)
    }
}

/// Parse one stream line into an orientation
///
/// # Errors
///
/// Returns `SensorReadGap` for malformed JSON or a degenerate quaternion.
pub fn parse_sample(line: &str) -> Result<UnitQuaternion<f32>> {
    let sample: QuaternionSample = serde_json::from_str(line)
        .map_err(|e| RigError::SensorReadGap(format!("Malformed orientation sample: {}", e)))?;

    sample
        .to_orientation()
        .ok_or_else(|| RigError::SensorReadGap(format!("Degenerate orientation sample: {:?}", sample)))
}

#[derive(Debug, Clone, Copy)]
struct TimedOrientation {
    orientation: UnitQuaternion<f32>,
    received: Instant,
}

type SampleSender = watch::Sender<Option<TimedOrientation>>;

/// Orientation sensor backed by a JSON Lines stream.
#[derive(Debug)]
pub struct QuaternionStream {
    latest: watch::Receiver<Option<TimedOrientation>>,
    /// Applied to every raw sample; recentres the heading
    reference: UnitQuaternion<f32>,
    stale_after: Duration,
}

impl QuaternionStream {
    /// Open the stream at `path`
    ///
    /// Opening a FIFO waits for the writer, so the open is bounded by
    /// `open_timeout`. On timeout the reader thread is left behind, still
    /// waiting, and exits on its own once the stream is gone.
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if the path cannot be opened in time.
    pub async fn open(path: impl AsRef<Path>, open_timeout: Duration, stale_after: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening orientation stream: {}", path.display());

        let (opened_tx, opened_rx) = oneshot::channel();
        let (tx, rx) = watch::channel(None);
        let reader_path = path.clone();

        spawn_reader(move || match std::fs::File::open(&reader_path) {
            Ok(file) => {
                if opened_tx.send(Ok(())).is_ok() {
                    read_samples(file, &tx);
                }
            }
            Err(e) => {
                let _ = opened_tx.send(Err(e));
            }
        })?;

        match tokio::time::timeout(open_timeout, opened_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return Err(open_failed(&path, e)),
            Ok(Err(_)) => {
                return Err(RigError::SensorUnavailable(format!(
                    "Reader for {} exited while opening",
                    path.display()
                )))
            }
            Err(_) => {
                return Err(RigError::SensorUnavailable(format!(
                    "Timed out after {:?} opening {}",
                    open_timeout,
                    path.display()
                )))
            }
        }

        info!("Orientation stream opened at {}", path.display());
        Ok(Self::with_receiver(rx, stale_after))
    }

    /// Read samples from any blocking byte source on a reader thread
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if the reader thread cannot be spawned.
    pub fn from_reader<R>(reader: R, stale_after: Duration) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        spawn_reader(move || read_samples(reader, &tx))?;
        Ok(Self::with_receiver(rx, stale_after))
    }

    fn with_receiver(latest: watch::Receiver<Option<TimedOrientation>>, stale_after: Duration) -> Self {
        Self {
            latest,
            reference: UnitQuaternion::identity(),
            stale_after,
        }
    }

    /// Wait until a sample newer than the last one waited for arrives
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if nothing arrives within `timeout` or the
    /// stream has ended.
    pub async fn wait_for_sample(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.latest.changed()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(RigError::SensorUnavailable("Orientation stream ended".to_string())),
            Err(_) => Err(RigError::SensorUnavailable(format!(
                "No orientation sample within {:?}",
                timeout
            ))),
        }
    }

    fn latest(&self) -> Result<TimedOrientation> {
        let latest = *self.latest.borrow();
        let sample = latest.ok_or_else(|| RigError::SensorReadGap("No orientation sample received yet".to_string()))?;

        let age = sample.received.elapsed();
        if age > self.stale_after {
            return Err(RigError::SensorReadGap(format!(
                "Latest orientation sample is {} ms old",
                age.as_millis()
            )));
        }

        Ok(sample)
    }
}

impl OrientationSensor for QuaternionStream {
    fn orientation(&mut self) -> Result<UnitQuaternion<f32>> {
        let sample = self.latest()?;
        Ok(self.reference * sample.orientation)
    }

    /// Recentre the heading only, so pitch and roll stay relative to gravity
    fn reset_reference(&mut self) {
        let latest = *self.latest.borrow();
        match latest {
            Some(sample) => {
                let yaw = extract_euler_angles(&sample.orientation).yaw;
                self.reference = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -yaw);
                info!("Orientation reference reset (heading {:.1}°)", yaw.to_degrees());
            }
            None => warn!("Cannot reset orientation reference: no sample received yet"),
        }
    }
}

fn open_failed(path: &Path, e: std::io::Error) -> RigError {
    RigError::SensorUnavailable(format!("Failed to open {}: {}", path.display(), e))
}

fn spawn_reader<F>(body: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name("orientation-reader".to_string())
        .spawn(body)
        .map(|_| ())
        .map_err(|e| RigError::SensorUnavailable(format!("Failed to spawn reader thread: {}", e)))
}

/// Publish every valid line until the stream ends or nobody is listening
fn read_samples<R: Read>(reader: R, tx: &SampleSender) {
    for line in BufReader::new(reader).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Orientation stream read failed: {}", e);
                return;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_sample(line) {
            Ok(orientation) => {
                let sample = TimedOrientation {
                    orientation,
                    received: Instant::now(),
                };
                if tx.send(Some(sample)).is_err() {
                    debug!("Orientation stream closed by its reader");
                    return;
                }
            }
            Err(e) => debug!("Skipping orientation line: {}", e),
        }
    }

    warn!("Orientation stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;
    use std::process::Command;

    const WAIT: Duration = Duration::from_secs(2);

    fn yaw_line(degrees: f32) -> String {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians());
        format!(
            "{{\"x\":{},\"y\":{},\"z\":{},\"w\":{}}}\n",
            q.i, q.j, q.k, q.w
        )
    }

    fn make_fifo(dir: &tempfile::TempDir) -> PathBuf {
        let fifo = dir.path().join("hmd.fifo");
        let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());
        fifo
    }

    #[test]
    fn test_parse_sample() {
        let q = parse_sample(r#"{"x":0.0,"y":0.0,"z":0.0,"w":1.0}"#).unwrap();
        assert_eq!(q, UnitQuaternion::identity());
    }

    #[test]
    fn test_parse_sample_normalizes() {
        let q = parse_sample(r#"{"x":0.0,"y":0.0,"z":0.0,"w":2.0}"#).unwrap();
        assert!((q.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_sample_rejects_garbage() {
        assert!(matches!(parse_sample("not json"), Err(RigError::SensorReadGap(_))));
        assert!(matches!(parse_sample(r#"{"x":1.0}"#), Err(RigError::SensorReadGap(_))));
        assert!(matches!(
            parse_sample(r#"{"x":0.0,"y":0.0,"z":0.0,"w":0.0}"#),
            Err(RigError::SensorReadGap(_))
        ));
    }

    #[test]
    fn test_non_finite_sample_is_degenerate() {
        let sample = QuaternionSample { x: f32::NAN, y: 0.0, z: 0.0, w: 1.0 };
        assert!(sample.to_orientation().is_none());
    }

    #[tokio::test]
    async fn test_no_sample_is_a_gap() {
        let (_writer, reader) = UnixStream::pair().unwrap();
        let mut stream = QuaternionStream::from_reader(reader, Duration::from_secs(1)).unwrap();
        assert!(matches!(stream.orientation(), Err(RigError::SensorReadGap(_))));
    }

    #[tokio::test]
    async fn test_latest_sample_wins() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut stream = QuaternionStream::from_reader(reader, Duration::from_secs(5)).unwrap();

        writer.write_all(yaw_line(10.0).as_bytes()).unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();
        writer.write_all(b"garbage\n\n").unwrap();
        writer.write_all(yaw_line(25.0).as_bytes()).unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();

        let yaw = extract_euler_angles(&stream.orientation().unwrap()).yaw;
        assert!((yaw.to_degrees() - 25.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_stale_sample_is_a_gap() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut stream = QuaternionStream::from_reader(reader, Duration::from_millis(20)).unwrap();

        writer.write_all(yaw_line(0.0).as_bytes()).unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(matches!(stream.orientation(), Err(RigError::SensorReadGap(_))));
    }

    #[tokio::test]
    async fn test_reset_reference_recentres_heading() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut stream = QuaternionStream::from_reader(reader, Duration::from_secs(5)).unwrap();

        writer.write_all(yaw_line(40.0).as_bytes()).unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();
        stream.reset_reference();

        let yaw = extract_euler_angles(&stream.orientation().unwrap()).yaw;
        assert!(yaw.to_degrees().abs() < 1e-3);

        writer.write_all(yaw_line(55.0).as_bytes()).unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();
        let yaw = extract_euler_angles(&stream.orientation().unwrap()).yaw;
        assert!((yaw.to_degrees() - 15.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_stream_end_reported_while_waiting() {
        let (writer, reader) = UnixStream::pair().unwrap();
        let mut stream = QuaternionStream::from_reader(reader, Duration::from_secs(1)).unwrap();
        drop(writer);

        assert!(matches!(
            stream.wait_for_sample(WAIT).await,
            Err(RigError::SensorUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_open_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaw_line(-20.0).as_bytes()).unwrap();
        file.flush().unwrap();

        let mut stream = QuaternionStream::open(file.path(), WAIT, Duration::from_secs(5))
            .await
            .unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();

        let yaw = extract_euler_angles(&stream.orientation().unwrap()).yaw;
        assert!((yaw.to_degrees() + 20.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_open_missing_path_is_unavailable() {
        let result = QuaternionStream::open(
            "/nonexistent/hmd/orientation.jsonl",
            WAIT,
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(RigError::SensorUnavailable(_))));
    }

    #[tokio::test]
    async fn test_open_waits_for_fifo_writer() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = make_fifo(&dir);

        let writer_path = fifo.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            let mut pipe = std::fs::OpenOptions::new().write(true).open(writer_path).unwrap();
            pipe.write_all(yaw_line(12.0).as_bytes()).unwrap();
        });

        let mut stream = QuaternionStream::open(&fifo, WAIT, Duration::from_secs(5))
            .await
            .unwrap();
        stream.wait_for_sample(WAIT).await.unwrap();
        writer.join().unwrap();

        let yaw = extract_euler_angles(&stream.orientation().unwrap()).yaw;
        assert!((yaw.to_degrees() - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_fifo_without_writer_times_out_and_runtime_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = make_fifo(&dir);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(QuaternionStream::open(
            &fifo,
            Duration::from_millis(100),
            Duration::from_secs(1),
        ));
        match result {
            Err(RigError::SensorUnavailable(msg)) => assert!(msg.contains("Timed out")),
            other => panic!("Expected SensorUnavailable, got: {:?}", other),
        }

        // Dropping the runtime must not wait on the reader still stuck in open
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(3)).is_ok());

        // Release the stuck reader
        let _ = std::fs::OpenOptions::new().write(true).open(&fifo);
    }
}
