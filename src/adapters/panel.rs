//! Text panel display sink.
//!
//! Composes the four status lines shown on the 128×64 OLED and hands them
//! to a [`PanelDriver`].  Glyph rendering and the controller's transport
//! bytes live behind the driver.
//!
//! ```text
//! ┌─────────────────────┐
//! │ TEMP MONITOR        │
//! │ TEMP: 23.4C         │
//! │ HUMI: 56.7%         │
//! │ STATUS: NORMAL      │
//! └─────────────────────┘
//! ```

use core::fmt::Write;

use heapless::String;

use crate::app::ports::DisplaySink;
use crate::app::state::{Reading, SystemState};
use crate::error::PipelineError;

/// Characters per line with a 6 px font on a 128 px panel.
pub const LINE_CHARS: usize = 21;
pub const LINES: usize = 4;

pub type Line = String<LINE_CHARS>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelLines {
    pub lines: [Line; LINES],
}

impl PanelLines {
    pub fn compose(reading: &Reading, state: SystemState) -> Self {
        let mut lines: [Line; LINES] = Default::default();
        // Overflow truncates the line; every format below fits in 21 chars.
        let _ = lines[0].push_str("TEMP MONITOR");
        let _ = write!(lines[1], "TEMP: {:.1}C", reading.temperature_c);
        let _ = write!(lines[2], "HUMI: {:.1}%", reading.humidity_pct);
        let _ = write!(lines[3], "STATUS: {}", state.label());
        Self { lines }
    }
}

/// Pushes composed lines to the physical panel.
pub trait PanelDriver {
    fn draw(&mut self, lines: &PanelLines) -> Result<(), PipelineError>;
}

/// [`DisplaySink`] that renders only when the content changed.  Pushing
/// the same frame twice is harmless, and a later frame always replaces it.
pub struct TextPanel<P: PanelDriver> {
    driver: P,
    shown: Option<PanelLines>,
}

impl<P: PanelDriver> TextPanel<P> {
    pub fn new(driver: P) -> Self {
        Self {
            driver,
            shown: None,
        }
    }

    pub fn shown(&self) -> Option<&PanelLines> {
        self.shown.as_ref()
    }

    pub fn driver(&self) -> &P {
        &self.driver
    }
}

impl<P: PanelDriver> DisplaySink for TextPanel<P> {
    fn on_reading(&mut self, reading: &Reading, state: SystemState) -> Result<(), PipelineError> {
        let lines = PanelLines::compose(reading, state);
        if self.shown.as_ref() == Some(&lines) {
            return Ok(());
        }
        self.driver.draw(&lines)?;
        self.shown = Some(lines);
        Ok(())
    }
}
