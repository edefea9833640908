//! Hardware-backed implementations of the capture seams, plus the simulated
//! stand-ins behind `--simulate`.
//!
//! Only the LCD needs a hardware-specific crate; it sits behind the
//! `hardware` cargo feature so the pipeline builds and runs anywhere.

pub mod camera;
pub mod display;
pub mod sensor;

pub use camera::{SimulatedCamera, StillCamera, DEFAULT_CAMERA_COMMAND};
#[cfg(feature = "hardware")]
pub use display::Lcd;
pub use display::{LogDisplay, DEFAULT_LCD_ADDRESS, DEFAULT_LCD_BUS};
pub use sensor::{SimulatedProbe, SysfsProbe, DEFAULT_SENSOR_PATH};
