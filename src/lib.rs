//! Reorganizes generated benchmark images into a canonical directory layout
//! and splits composite grid images into their sub-images.

pub mod config;
pub mod error;
pub mod grid;
pub mod logging;
pub mod manifest;
pub mod matcher;
pub mod materialize;
pub mod placement;
pub mod reorganize;
pub mod report;
pub mod rules;

pub use config::ReorgConfig;
pub use error::{ReorgError, Result};
