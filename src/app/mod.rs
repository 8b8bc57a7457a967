//! Binary-side application wiring: settings, prompt parsing, dispatcher.

pub(crate) mod config_runtime;
pub(crate) mod input;
pub(crate) mod runtime;
pub(crate) mod terminal;
