//! Domain layer: pure business logic with no process or OS dependencies.

pub mod session;
