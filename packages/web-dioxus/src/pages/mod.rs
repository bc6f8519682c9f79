//! Application pages

mod crawl;
mod home;
mod not_found;

pub use crawl::*;
pub use home::*;
pub use not_found::*;
