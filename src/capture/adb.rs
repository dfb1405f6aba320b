//! adb subprocess calls for screencap and input tap.

use image::RgbaImage;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::{CaptureError, Device, decode_screencap};
use crate::automation::config::AppConfig;
use crate::calibration::PixelPoint;

/// Interval between child exit checks.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Collected output of a finished subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Talks to one device through the adb executable.
#[derive(Clone, Debug)]
pub struct AdbDevice {
    adb_path: String,
    serial: Option<String>,
    capture_timeout: Duration,
    tap_timeout: Duration,
}

impl AdbDevice {
    pub fn new(
        adb_path: impl Into<String>,
        serial: Option<String>,
        capture_timeout: Duration,
        tap_timeout: Duration,
    ) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
            capture_timeout,
            tap_timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.adb_path.clone(),
            config.device_serial.clone(),
            config.capture_timeout(),
            config.tap_timeout(),
        )
    }

    /// Full adb argument list, device selection first.
    pub fn args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(rest.len() + 2);
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    fn command(&self, rest: &[&str]) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        cmd.args(self.args(rest));
        cmd
    }

    /// Runs `screencap -p` on the device and returns the raw PNG bytes.
    pub fn screencap_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let output = run_with_timeout(
            self.command(&["shell", "screencap", "-p"]),
            self.capture_timeout,
        )?;
        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl Device for AdbDevice {
    fn capture(&mut self) -> Result<RgbaImage, CaptureError> {
        let bytes = self.screencap_bytes()?;
        decode_screencap(&bytes)
    }

    fn tap(&mut self, point: PixelPoint) {
        let x = point.x.to_string();
        let y = point.y.to_string();
        let cmd = self.command(&["shell", "input", "tap", &x, &y]);
        match run_with_timeout(cmd, self.tap_timeout) {
            Ok(output) if output.status.success() => {}
            Ok(output) => crate::log(&format!(
                "Tap at {} failed ({}): {}",
                point,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(e) => crate::log(&format!("Tap at {} failed: {}", point, e)),
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = sender.send(buf);
        });
        receiver
    })
}

/// Waits for a pipe reader until `deadline`. A reader still blocked then
/// (the pipe is held open by a leftover grandchild) is abandoned.
fn collect(
    reader: Option<Receiver<Vec<u8>>>,
    deadline: Instant,
    timeout: Duration,
) -> Result<Vec<u8>, CaptureError> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Ok(buf),
        Err(RecvTimeoutError::Timeout) => Err(CaptureError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Runs a command to completion, killing it if it outlives `timeout`.
///
/// Both pipes are drained on background threads so a large stdout cannot
/// stall the child. Reading the pipes shares the same deadline as the
/// child itself.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<CommandOutput, CaptureError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                kill(&mut child);
                return Err(e.into());
            }
        }
        if Instant::now() > deadline {
            kill(&mut child);
            return Err(CaptureError::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(CommandOutput {
        status,
        stdout: collect(stdout, deadline, timeout)?,
        stderr: collect(stderr, deadline, timeout)?,
    })
}
