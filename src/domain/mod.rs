// Domain layer: device models and the bus port. No I/O here.

pub mod model;
pub mod ports;
