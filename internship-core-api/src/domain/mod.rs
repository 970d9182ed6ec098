pub mod ability;
pub mod approval;
pub mod audit;
pub mod evaluation;
pub mod notification;
pub mod principal;
pub mod token;

pub use ability::*;
pub use approval::*;
pub use audit::*;
pub use evaluation::*;
pub use notification::*;
pub use principal::*;
pub use token::*;
