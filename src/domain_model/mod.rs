mod expiration;
mod session;
mod token;

pub use expiration::*;
pub use session::*;
pub use token::*;
