mod stewart_error;
pub use stewart_error::*;
