//! Project ledger service: money rules, warranty tracking and reporting over
//! a subscribed document store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod finance;
pub mod handlers;
pub mod ident;
pub mod invite;
pub mod models;
pub mod query;
pub mod stats;
pub mod store;
pub mod warranty;
pub mod workspace;
