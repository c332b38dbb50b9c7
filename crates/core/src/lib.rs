#![forbid(unsafe_code)]

pub mod error;
pub mod evaluate;
pub mod model;
pub mod time;

pub use error::Error;
pub use evaluate::evaluate;
pub use time::Clock;
