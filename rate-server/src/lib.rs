#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to the other modules.
mod fmt;

mod config;
mod context;
mod driver;
mod message;
mod server;

pub use config::RateServerConfig;
pub use context::RateServerContext;
pub use driver::{I2sRateReport, I2sRateSource, SharedI2sRateInfo};
pub use message::{
    I2S_RATE_INFO_SIZE, I2sRateInfo, RATE_FRAME_CAPACITY, RATIO_Q_FORMAT, RateFrame,
    USB_RATE_INFO_SIZE, UsbRateInfo, WireError,
};
pub use server::RateServer;

pub use fixed_float::{DivideOperations, FixedFloat, PortableDivide};
