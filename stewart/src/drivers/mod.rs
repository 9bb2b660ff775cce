#[cfg(feature="driver")]
mod driver;
#[cfg(feature="driver")]
pub use driver::*;

#[cfg(feature="serial")]
mod serial;
#[cfg(feature="serial")]
pub use serial::*;

mod models;
pub use models::*;

mod driver_config;
pub use driver_config::*;
