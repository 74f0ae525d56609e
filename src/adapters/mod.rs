//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                  |
//! |-------------|---------------|------------------------------|
//! | `panel`     | DisplaySink   | any [`panel::PanelDriver`]   |
//! | `log_sink`  | PanelDriver   | Serial log output            |
//! | `telemetry` | TelemetrySink | history ring + query surface |
//! | `http_api`  | (none)        | EspHttpServer routes         |
//! | `time`      | (none)        | ESP32 system timer           |

pub mod http_api;
pub mod log_sink;
pub mod panel;
pub mod telemetry;
pub mod time;
