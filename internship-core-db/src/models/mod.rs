pub mod approval;
pub mod audit;
pub mod enrollment;
pub mod notification;
pub mod principal;
pub mod token;
pub mod tracker;
pub mod training;

pub use approval::*;
pub use audit::*;
pub use enrollment::*;
pub use notification::*;
pub use principal::*;
pub use token::*;
pub use tracker::*;
pub use training::*;
