// Library exports for the Stewart platform board simulator

pub mod board;
pub mod forward;

pub use board::BoardState;
pub use forward::estimate_pose;
