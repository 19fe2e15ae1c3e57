//! ledchain: driver and color state model for daisy-chained P9813 RGB LED modules.

pub mod chain;
pub mod color;
pub mod config;
pub mod error;
pub mod gpio;
pub mod protocol;
pub mod service;
pub mod store;

pub use chain::{ChainDriver, Controller, ControllerMut};
pub use color::Color;
pub use error::LedchainError;
pub use service::{ColorUpdate, SharedChain};
