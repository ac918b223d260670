//! Command handlers grouped by concern.

pub(crate) mod config;
pub(crate) mod process;
pub(crate) mod status;
pub(crate) mod upload;
