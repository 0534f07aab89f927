//! GraphQL gateway over a document store of posts and comments and an
//! upstream TV show service.
//!
//! Feature modules under [`graphql`] each contribute a schema fragment and a
//! resolver map; [`graphql::composer`] merges them into one schema at
//! startup. Resolvers reach their data only through the per-request
//! [`graphql::RequestContext`].

pub mod config;
pub mod connector;
pub mod database;
pub mod errors;
pub mod graphql;
pub mod server;
pub mod storage;
