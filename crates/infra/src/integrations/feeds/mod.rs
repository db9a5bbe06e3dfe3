//! RSS 2.0 feed subscriptions

mod adapter;
mod parser;

pub use adapter::FeedsAdapter;
pub use parser::parse_rss;
