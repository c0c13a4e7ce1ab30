//! Synchronous client core for a headless CMS content API.
//!
//! # Overview
//! `ApiClient` talks to a Strapi-style REST backend: bracket-notation query
//! strings, `{ data, meta }` envelopes, bearer-token auth and content-type
//! discovery. Each collection gets a `Collection` accessor that walks
//! pagination, performs CRUD and keeps a per-collection cache of `Record`
//! snapshots.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`).
//!   A `Transport` performs the round-trip; `UreqTransport` is the default,
//!   tests use scripted transports. Status interpretation stays in the core.
//! - Calls are blocking and strictly sequential. Shared state (token, GET
//!   memo table, caches) sits behind `parking_lot` locks that are never held
//!   across a request.
//! - `QueryBuilder` is independent of the client and usable on its own.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod encoding;
pub mod error;
pub mod http;
pub mod query;
pub mod record;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use collection::{Collection, ListOptions, PAGE_SIZE};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use query::{
    parse_query, stringify_query, Filter, FilterOperator, FilterValue, Populate, PopulateChild,
    PopulateChildren, PopulateDeep, PublicationState, QueryBuilder, Sort, SortOrder,
};
pub use record::Record;
pub use transport::UreqTransport;
pub use types::{
    AuthResponse, ForgotPassword, LoginCredentials, Pagination, RegisterCredentials,
    ResetPassword, User,
};
