pub mod device;
pub mod manager;
pub mod topics;

pub use crate::domain::model::{Publication, Rgbw, StateReport};
pub use crate::domain::ports::MessageBus;
pub use crate::utils::error::Result;
