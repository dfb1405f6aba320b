//! Firework Counter
//!
//! Polls an Android device over adb, counts the colored blocks in two 5x5
//! grids on screen and types the count into the on-screen keypad whenever
//! it changes.

mod automation;
mod calibration;
mod capture;
mod detection;
mod gui;
mod paths;

use anyhow::{Result, anyhow};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use automation::queue::create_frame_queue;

/// Set by the Ctrl+C handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("firework_counter.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("firework_counter.log");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    // Load configuration
    automation::init_config();
    let config = automation::get_config().clone();

    let result = if config.show_window {
        run_with_viewer(config)
    } else {
        run_headless(config)
    };

    if INTERRUPTED.load(Ordering::SeqCst) {
        log("Real-time detection stopped");
    }
    result
}

/// Routes Ctrl+C to the detection loop's abort flag.
fn install_interrupt_handler() {
    let installed = ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        automation::request_abort();
    });
    if let Err(e) = installed {
        log(&format!("Warning: failed to install Ctrl+C handler: {}", e));
    }
}

fn run_with_viewer(config: automation::AppConfig) -> Result<()> {
    let (sender, receiver) = create_frame_queue();
    let handle = automation::start_detection(config, Some(sender))?;
    install_interrupt_handler();

    log("Opening viewer window...");
    let viewer = gui::run_viewer(receiver);

    // The window may have been closed directly; stop the loop either way.
    automation::request_abort();
    join_detection(handle)?;

    match viewer {
        Ok(()) => {
            log("Viewer exited normally");
            Ok(())
        }
        Err(e) => {
            log(&format!("Viewer error: {}", e));
            Err(anyhow!("Viewer error: {}", e))
        }
    }
}

fn run_headless(config: automation::AppConfig) -> Result<()> {
    let handle = automation::start_detection(config, None)?;
    install_interrupt_handler();
    log("Running without viewer (Ctrl+C to stop)");
    join_detection(handle)
}

fn join_detection(handle: JoinHandle<()>) -> Result<()> {
    handle
        .join()
        .map_err(|_| anyhow!("Detection thread panicked"))
}
