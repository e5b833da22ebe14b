pub mod bench;
pub mod config;
pub mod error;
pub mod loader;
pub mod mem;
pub mod record;
pub mod skip_list;
pub mod store;

pub use error::{Error, Result};
