//! Log-based panel driver.
//!
//! Implements [`PanelDriver`] by writing the composed panel lines to the
//! logger (UART / USB-CDC in production, stderr in simulation).  An SSD1306
//! driver would implement the same trait.

use log::info;

use super::panel::{PanelDriver, PanelLines};
use crate::error::PipelineError;

/// Driver that logs every frame the panel would show.
pub struct LogPanel;

impl LogPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelDriver for LogPanel {
    fn draw(&mut self, lines: &PanelLines) -> Result<(), PipelineError> {
        let [title, temp, humi, status] = &lines.lines;
        info!("PANEL | {} | {} | {} | {}", title, temp, humi, status);
        Ok(())
    }
}
