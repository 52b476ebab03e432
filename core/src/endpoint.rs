//! Stateless request builder and response parser for one Airtable table.
//!
//! # Design
//! `TableEndpoint` holds the table route, the auth header and the id column,
//! all fixed at construction. Each operation is split into a `build_*`
//! method producing an `HttpRequest` and a `parse_*` method consuming an
//! `HttpResponse`; nothing here performs I/O.
//!
//! Validation is done by decoding into typed bodies: a missing `records`
//! key, a non-array `records`, or an element without `id`/`fields` all fail
//! deserialization and surface as `BadResponse`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::json;

use crate::config::{ConnectionInfo, TableInfo};
use crate::error::{AirtableError, Result};
use crate::formula;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CellFormatOptions, Fields, ListParams, Record, RecordPage};

#[derive(Deserialize)]
struct RecordsBody {
    records: Vec<Record>,
}

/// Request builder and response parser for a single table.
#[derive(Clone)]
pub struct TableEndpoint {
    route: String,
    authorization: String,
    id_column: String,
}

impl TableEndpoint {
    pub fn new(connection: &ConnectionInfo, table: &TableInfo) -> Self {
        Self {
            route: [connection.base_url(), connection.base_id(), table.name()].join("/"),
            authorization: format!("Bearer {}", connection.api_key()),
            id_column: table.id_column().to_string(),
        }
    }

    /// `{base_url}/{base_id}/{table_name}`.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn build_list_records(&self, params: &ListParams, offset: Option<&str>) -> HttpRequest {
        self.get(&params.query_params(offset))
    }

    pub fn build_get_record(&self, id: &str, cell_format: &CellFormatOptions) -> HttpRequest {
        let formula = formula::find_by_id(id, &self.id_column);
        let mut params = vec![("filterByFormula", formula.as_str())];
        params.extend(cell_format.query_params());
        self.get(&params)
    }

    pub fn build_records_by_fields(
        &self,
        fields: &BTreeMap<String, Option<String>>,
        params: &ListParams,
        offset: Option<&str>,
    ) -> HttpRequest {
        let mut query = vec![("filterByFormula", formula::match_fields(fields))];
        query.extend(params.query_params(offset));
        self.get(&query)
    }

    pub fn build_create_record(&self, fields: &Fields) -> Result<HttpRequest> {
        let body = serde_json::to_string(&json!({ "records": [{ "fields": fields }] }))?;
        Ok(self.with_body(HttpMethod::Post, self.route.clone(), body))
    }

    pub fn build_update_record(&self, id: &str, fields: &Fields) -> Result<HttpRequest> {
        let body = serde_json::to_string(&json!({ "fields": fields }))?;
        Ok(self.with_body(HttpMethod::Put, format!("{}/{id}", self.route), body))
    }

    /// Parse one page of a list or filter query.
    pub fn parse_record_page(&self, response: HttpResponse) -> Result<RecordPage> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// Parse a response that must hold exactly one record under `records`.
    ///
    /// Used for both id lookups and record creation.
    pub fn parse_single_record(&self, response: HttpResponse) -> Result<Record> {
        check_status(&response)?;
        let body: RecordsBody = decode(&response.body)?;
        let count = body.records.len();
        let mut records = body.records.into_iter();
        match (records.next(), count) {
            (Some(record), 1) => Ok(record),
            _ => Err(AirtableError::bad_response(format!(
                "expected exactly one record, got {count}"
            ))),
        }
    }

    /// Parse an update response, which is a bare record object.
    pub fn parse_update_record(&self, response: HttpResponse) -> Result<Record> {
        check_status(&response)?;
        decode(&response.body)
    }

    fn get<S: AsRef<str>>(&self, params: &[(&str, S)]) -> HttpRequest {
        let url = if params.is_empty() {
            self.route.clone()
        } else {
            format!("{}?{}", self.route, formula::query_string(params))
        };
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: vec![("Authorization".to_string(), self.authorization.clone())],
            body: None,
        }
    }

    fn with_body(&self, method: HttpMethod, url: String, body: String) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![
                ("Authorization".to_string(), self.authorization.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        }
    }
}

impl fmt::Debug for TableEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableEndpoint")
            .field("route", &self.route)
            .field("authorization", &"Bearer <redacted>")
            .field("id_column", &self.id_column)
            .finish()
    }
}

/// Map any non-2xx status to `AirtableError::Api`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(AirtableError::Api {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| AirtableError::bad_response(e.to_string()))
}
