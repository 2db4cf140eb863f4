pub mod animation;
pub mod bearing;
pub mod error;
pub mod fleet;
pub mod orientation;
pub mod position;
pub mod ui;

pub use error::{CoreError, Result};
pub use position::GeoPosition;
