pub mod approval;
pub mod audit;
pub mod enrollment;
pub mod notification;
pub mod pagination;
pub mod principal;
pub mod store;
pub mod token;
pub mod tracker;
pub mod training;

// Re-exports
pub use approval::*;
pub use audit::*;
pub use enrollment::*;
pub use notification::*;
pub use pagination::*;
pub use principal::*;
pub use store::*;
pub use token::*;
pub use tracker::*;
pub use training::*;
