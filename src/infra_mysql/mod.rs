mod token_store_mysql;

pub use token_store_mysql::*;

mod util;
