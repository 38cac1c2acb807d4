pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod merger;
pub mod parser;
pub mod source;
