//! Adapters connecting the application to external systems.

pub mod outbound;
