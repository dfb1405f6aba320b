//! Detection runner - main entry point for the polling loop.
//!
//! Spawns the detection thread, drives `DetectionLoop` until abort, and
//! exposes the running flag and last entered count through globals.

use anyhow::{Result, anyhow};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::automation::config::AppConfig;
use crate::automation::pacer::{Pacer, ThreadPacer};
use crate::automation::queue::FrameUpdate;
use crate::automation::state::{CycleOutcome, DetectionLoop, reset_abort_flag};
use crate::capture::{AdbDevice, Device};

/// Global flag indicating if the detection loop is running.
static LOOP_RUNNING: AtomicBool = AtomicBool::new(false);

/// Last count entered on the device, -1 before the first one.
static LAST_COUNT: AtomicI32 = AtomicI32::new(-1);

/// Consecutive failed cycles between summary log lines.
const FAILURE_REPORT_INTERVAL: u64 = 10;

/// Checks if the detection loop is currently running.
pub fn is_loop_running() -> bool {
    LOOP_RUNNING.load(Ordering::SeqCst)
}

/// Gets the last count entered on the device.
pub fn get_last_count() -> Option<u8> {
    u8::try_from(LAST_COUNT.load(Ordering::SeqCst)).ok()
}

/// Starts the detection loop in a background thread.
///
/// Returns the thread handle; the thread ends once abort is requested.
///
/// # Errors
/// Returns an error if the loop is already running.
pub fn start_detection(
    config: AppConfig,
    frames: Option<Sender<FrameUpdate>>,
) -> Result<JoinHandle<()>> {
    if LOOP_RUNNING.swap(true, Ordering::SeqCst) {
        return Err(anyhow!("Detection is already running"));
    }

    reset_abort_flag();
    LAST_COUNT.store(-1, Ordering::SeqCst);

    let device = AdbDevice::from_config(&config);
    crate::log(&format!(
        "Starting detection: adb={} device={} (press q in the viewer or Ctrl+C to stop)",
        config.adb_path,
        config.device_serial.as_deref().unwrap_or("<default>")
    ));

    let mut ctx = DetectionLoop::new(device, ThreadPacer::new(), config);
    if let Some(frames) = frames {
        ctx = ctx.with_frame_sink(frames);
    }

    let spawned = thread::Builder::new()
        .name("detection".to_string())
        .spawn(move || {
            run_detection_loop(&mut ctx);
            LOOP_RUNNING.store(false, Ordering::SeqCst);
            crate::log("Detection thread finished");
        });

    match spawned {
        Ok(handle) => Ok(handle),
        Err(e) => {
            LOOP_RUNNING.store(false, Ordering::SeqCst);
            Err(anyhow!("Failed to spawn detection thread: {}", e))
        }
    }
}

/// Runs cycles until the pacer reports cancellation.
pub fn run_detection_loop<D: Device, P: Pacer>(ctx: &mut DetectionLoop<D, P>) {
    let mut failed_streak: u64 = 0;
    while !ctx.cancelled() {
        match ctx.step() {
            CycleOutcome::Replayed(count) | CycleOutcome::Unchanged(count) => {
                if failed_streak >= FAILURE_REPORT_INTERVAL {
                    crate::log(&format!("Detection recovered after {} failed cycles", failed_streak));
                }
                failed_streak = 0;
                LAST_COUNT.store(count as i32, Ordering::SeqCst);
            }
            CycleOutcome::Failed(e) => {
                failed_streak += 1;
                if failed_streak % FAILURE_REPORT_INTERVAL == 0 {
                    crate::log(&format!(
                        "{} cycles in a row without a count, last error: {}",
                        failed_streak, e
                    ));
                }
            }
            CycleOutcome::Aborted => break,
        }

        if !ctx.wait_for_next_cycle() {
            break;
        }
    }

    crate::log(&format!(
        "Detection stopped after {} cycles (last count {:?})",
        ctx.cycle(),
        ctx.last_count()
    ));
}
