pub mod entry;
pub mod phase;
pub mod side;
pub mod signal;
