mod primitives;
mod session_manager_impl;

pub use primitives::*;
pub use session_manager_impl::*;
