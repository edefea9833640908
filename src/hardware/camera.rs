//! Still-frame cameras.

use std::process::Command;

use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::telemetry::FrameCamera;

/// Default capture command shipped with Raspberry Pi OS.
pub const DEFAULT_CAMERA_COMMAND: &str = "rpicam-still";

/// Camera that shells out to the stock still-capture tool and reads the
/// JPEG from its stdout.
pub struct StillCamera {
    command: String,
    width: u32,
    height: u32,
    rotation: u32,
}

impl StillCamera {
    /// Create a camera invoking `command` with the given frame geometry.
    pub fn new(command: impl Into<String>, width: u32, height: u32, rotation: u32) -> Self {
        Self {
            command: command.into(),
            width,
            height,
            rotation,
        }
    }
}

impl FrameCamera for StillCamera {
    fn capture_jpeg(&mut self) -> Result<Vec<u8>> {
        let output = Command::new(&self.command)
            .args([
                "--width",
                &self.width.to_string(),
                "--height",
                &self.height.to_string(),
                "--rotation",
                &self.rotation.to_string(),
                "--nopreview",
                "--output",
                "-",
            ])
            .output()
            .map_err(|err| {
                TelemetryError::capture_error(format!("cannot run {}: {err}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TelemetryError::capture_error(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(TelemetryError::capture_error(format!(
                "{} produced no image data",
                self.command
            )));
        }

        debug!(bytes = output.stdout.len(), "frame captured");
        Ok(output.stdout)
    }
}

/// Minimal but well-formed JPEG returned by the simulated camera.
static SAMPLE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Camera that returns a canned frame, for runs without the hardware.
#[derive(Debug, Default)]
pub struct SimulatedCamera;

impl SimulatedCamera {
    /// Create the simulated camera.
    pub fn new() -> Self {
        Self
    }
}

impl FrameCamera for SimulatedCamera {
    fn capture_jpeg(&mut self) -> Result<Vec<u8>> {
        Ok(SAMPLE_JPEG.to_vec())
    }
}
