mod clock;
mod random_source;
mod token_store;

pub use clock::*;
pub use random_source::*;
pub use token_store::*;
