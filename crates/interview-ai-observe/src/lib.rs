//! Observability setup for Interview AI: tracing subscriber and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
