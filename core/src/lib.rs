//! Blocking client for the Airtable REST API.
//!
//! # Overview
//! `AirtableClient` lists, looks up, filters, creates and updates records
//! in one table of an Airtable base. Listing operations return a lazy
//! iterator that follows Airtable's `offset` pagination on demand.
//!
//! # Design
//! - `TableEndpoint` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network, so callers can own the I/O.
//! - `Transport` is the seam for the round trip; `UreqTransport` is the
//!   default.
//! - Errors are one enum: non-2xx answers are `Api`, 2xx answers with an
//!   unexpected body are `BadResponse`.
//! - Caller contract violations (string cell format without time zone or
//!   locale) panic when the options are built, before any request exists.
//!
//! ```no_run
//! use airtable_core::{AirtableClient, ConnectionInfo, ListParams, TableInfo};
//!
//! let connection = ConnectionInfo::new("appXXXXXXXXXXXXXX", "patXXXXXXXX");
//! let table = TableInfo::new("Languages", "Identifier");
//! let client = AirtableClient::new(&connection, &table);
//!
//! for record in client.list_records(&ListParams::new()) {
//!     let record = record?;
//!     println!("{} {:?}", record.id, record.fields);
//! }
//!
//! let filter = std::collections::BTreeMap::from([("Family".to_string(), Some("Turkic".to_string()))]);
//! for record in client.get_records_by_fields(&filter, &ListParams::unpaged()) {
//!     println!("{}", record?.id);
//! }
//! # Ok::<(), airtable_core::AirtableError>(())
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod formula;
pub mod http;
pub mod pages;
pub mod transport;
pub mod types;

pub use client::AirtableClient;
pub use config::{ConnectionInfo, TableInfo, DEFAULT_BASE_URL};
pub use endpoint::TableEndpoint;
pub use error::{AirtableError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use pages::Records;
pub use transport::UreqTransport;
pub use types::{CellFormat, CellFormatOptions, Fields, ListParams, Record, RecordPage};
