//! Observability for the method engine
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle and dispatch events
//! - Atomic dispatch counters
//!
//! Observability is read-only: it never changes the outcome of a
//! declaration or a dispatch.
//!
//! # Usage
//!
//! ```ignore
//! use aeroorm::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::MethodDeclared, &[("method", "sale.order.discount")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot};

/// Severity an event is logged at
pub fn event_severity(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_dispatch() {
        Severity::Trace
    } else {
        match event {
            Event::DispatchFailed | Event::MethodDeclareRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}
