pub mod args;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod graphql;
pub mod model;
pub mod reconcile;
pub mod resolve;
pub mod server;
pub mod tools;

#[cfg(test)]
mod test_support;
