//! Reading displays.
//!
//! The I2C character LCD is only compiled in with the `hardware` feature;
//! [`LogDisplay`] is always available and is the fallback everywhere else.

use tracing::{debug, info};

use crate::error::Result;
use crate::telemetry::{Reading, ReadingDisplay};

/// Default I2C bus the LCD sits on.
pub const DEFAULT_LCD_BUS: u8 = 1;
/// Default I2C address of the LCD controller.
pub const DEFAULT_LCD_ADDRESS: u16 = 0x3e;

/// Display that writes readings to the log instead of a panel.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl LogDisplay {
    /// Create the log-backed display.
    pub fn new() -> Self {
        Self
    }
}

impl ReadingDisplay for LogDisplay {
    fn show(&mut self, reading: &Reading) -> Result<()> {
        info!(
            "display: {:.1}°C  {}",
            reading.temperature,
            reading.occupancy.label()
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        debug!("display cleared");
        Ok(())
    }
}

#[cfg(feature = "hardware")]
mod lcd {
    //! AIP31068-style two-line character LCD on I2C.

    use std::thread;
    use std::time::Duration;

    use rppal::i2c::I2c;

    use crate::error::{Result, TelemetryError};
    use crate::telemetry::{Reading, ReadingDisplay};

    const REG_COMMAND: u8 = 0x80;
    const REG_DATA: u8 = 0x40;
    const CMD_CLEAR: u8 = 0x01;
    const CMD_DISPLAY_ON: u8 = 0x0C;
    const CMD_LINE_ONE: u8 = 0x80;
    const CMD_LINE_TWO: u8 = 0xC0;
    // Function set, two lines, contrast and power per the controller datasheet.
    const INIT_SEQUENCE: [u8; 7] = [0x38, 0x39, 0x14, 0x73, 0x56, 0x6C, 0x38];
    const LINE_WIDTH: usize = 16;
    // The degree sign in the controller's character ROM.
    const DEGREE_GLYPH: u8 = 0xDF;

    /// Two-line character LCD driven over I2C.
    pub struct Lcd {
        i2c: I2c,
    }

    impl Lcd {
        /// Open and initialize the panel.
        pub fn open(bus: u8, address: u16) -> Result<Self> {
            let mut i2c = I2c::with_bus(bus).map_err(|err| {
                TelemetryError::display_error(format!("cannot open I2C bus {bus}: {err}"))
            })?;
            i2c.set_slave_address(address).map_err(|err| {
                TelemetryError::display_error(format!(
                    "cannot address LCD at {address:#04x}: {err}"
                ))
            })?;
            let mut lcd = Self { i2c };
            lcd.init()?;
            Ok(lcd)
        }

        fn init(&mut self) -> Result<()> {
            for command in INIT_SEQUENCE {
                self.command(command)?;
                thread::sleep(Duration::from_micros(100));
            }
            self.command(CMD_DISPLAY_ON)?;
            self.wipe()
        }

        fn command(&mut self, command: u8) -> Result<()> {
            self.i2c
                .smbus_write_byte(REG_COMMAND, command)
                .map_err(|err| {
                    TelemetryError::display_error(format!(
                        "LCD command {command:#04x} failed: {err}"
                    ))
                })
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            for ch in text.chars().take(LINE_WIDTH) {
                let byte = match ch {
                    '°' => DEGREE_GLYPH,
                    c if c.is_ascii() => c as u8,
                    _ => b'?',
                };
                self.i2c.smbus_write_byte(REG_DATA, byte).map_err(|err| {
                    TelemetryError::display_error(format!("LCD write failed: {err}"))
                })?;
            }
            Ok(())
        }

        fn wipe(&mut self) -> Result<()> {
            self.command(CMD_CLEAR)?;
            // The clear command needs a moment before the next write.
            thread::sleep(Duration::from_millis(2));
            Ok(())
        }
    }

    impl ReadingDisplay for Lcd {
        fn show(&mut self, reading: &Reading) -> Result<()> {
            self.wipe()?;
            self.command(CMD_LINE_ONE)?;
            self.write_text(&format!("Temp: {:.1}°C", reading.temperature))?;
            self.command(CMD_LINE_TWO)?;
            self.write_text(&reading.occupancy.label())
        }

        fn clear(&mut self) -> Result<()> {
            self.wipe()
        }
    }
}

#[cfg(feature = "hardware")]
pub use lcd::Lcd;
