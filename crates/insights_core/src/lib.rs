pub mod api;
pub mod clock;
pub mod error;
pub mod filter;
pub mod value;

pub use api::*;
pub use clock::*;
pub use error::{InsightsError, InsightsResult};
pub use filter::*;
pub use value::*;
