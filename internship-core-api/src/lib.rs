pub mod domain;
pub mod error;
pub mod requests;

pub use domain::*;
pub use error::*;
pub use requests::*;
