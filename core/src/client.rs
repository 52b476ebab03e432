//! Airtable client: a `TableEndpoint` paired with a `Transport`.
//!
//! # Design
//! The client adds no state of its own beyond what `TableEndpoint` fixes at
//! construction. Every operation issues exactly one request per page and
//! blocks on it; nothing is retried or cached. Listing operations return a
//! lazy [`Records`] iterator instead of a collected `Vec`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{ConnectionInfo, TableInfo};
use crate::endpoint::TableEndpoint;
use crate::error::{AirtableError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::pages::Records;
use crate::transport::UreqTransport;
use crate::types::{CellFormatOptions, Fields, ListParams, Record, RecordPage};

/// Blocking client for one Airtable table.
#[derive(Debug, Clone)]
pub struct AirtableClient<T = UreqTransport> {
    endpoint: TableEndpoint,
    transport: T,
}

impl AirtableClient<UreqTransport> {
    pub fn new(connection: &ConnectionInfo, table: &TableInfo) -> Self {
        Self::with_transport(connection, table, UreqTransport::new())
    }
}

impl<T: Transport> AirtableClient<T> {
    pub fn with_transport(connection: &ConnectionInfo, table: &TableInfo, transport: T) -> Self {
        Self {
            endpoint: TableEndpoint::new(connection, table),
            transport,
        }
    }

    pub fn endpoint(&self) -> &TableEndpoint {
        &self.endpoint
    }

    /// Every record of the table, following pagination lazily.
    pub fn list_records(&self, params: &ListParams) -> Records<'_> {
        let params = params.clone();
        Records::new(
            move |offset| self.endpoint.build_list_records(&params, offset),
            move |request| self.fetch_page(request),
        )
    }

    /// The single record whose id column contains `id`.
    ///
    /// Zero or several matches are reported as `BadResponse`.
    pub fn get_record(&self, id: &str, cell_format: &CellFormatOptions) -> Result<Record> {
        let request = self.endpoint.build_get_record(id, cell_format);
        let response = self.send(request)?;
        self.endpoint.parse_single_record(response)
    }

    /// Records whose columns equal the given values, following pagination
    /// lazily. `None` or empty values do not constrain the query.
    ///
    /// Pass [`ListParams::unpaged`] for the usual defaults; unlike
    /// `list_records`, this query sends no `pageSize` unless asked to.
    pub fn get_records_by_fields(
        &self,
        fields: &BTreeMap<String, Option<String>>,
        params: &ListParams,
    ) -> Records<'_> {
        let fields = fields.clone();
        let params = params.clone();
        Records::new(
            move |offset| self.endpoint.build_records_by_fields(&fields, &params, offset),
            move |request| self.fetch_page(request),
        )
    }

    /// Create one record and return it with its assigned id.
    pub fn create_record(&self, fields: &Fields) -> Result<Record> {
        let request = self.endpoint.build_create_record(fields)?;
        let response = self.send(request)?;
        self.endpoint.parse_single_record(response)
    }

    /// Replace the fields of record `id`.
    pub fn update_record(&self, id: &str, fields: &Fields) -> Result<Record> {
        let request = self.endpoint.build_update_record(id, fields)?;
        let response = self.send(request)?;
        self.endpoint.parse_update_record(response)
    }

    fn fetch_page(&self, request: HttpRequest) -> Result<RecordPage> {
        let response = self.send(request)?;
        self.endpoint.parse_record_page(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "sending airtable request");
        self.transport
            .execute(request)
            .map_err(AirtableError::Transport)
    }
}
