//! In-process imitation of Airtable's record endpoints.
//!
//! Serves `GET`/`POST /v0/{base_id}/{table}` and
//! `PUT /v0/{base_id}/{table}/{record_id}` with Airtable's query parameters,
//! bearer-token check, `offset` pagination and error body shape. Tables
//! spring into existence on first write and read as empty before that.

pub mod filter;

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

use filter::{cell_text, Filter};

pub const MAX_PAGE_SIZE: usize = 100;
pub const MAX_RECORDS_PER_WRITE: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Shared server state: the API key to accept, every table, and a hit counter.
pub struct MockAirtable {
    api_key: String,
    tables: RwLock<HashMap<String, Vec<StoredRecord>>>,
    requests: AtomicUsize,
}

pub type Db = Arc<MockAirtable>;

impl MockAirtable {
    pub fn new(api_key: impl Into<String>) -> Db {
        Arc::new(Self {
            api_key: api_key.into(),
            tables: RwLock::new(HashMap::new()),
            requests: AtomicUsize::new(0),
        })
    }

    /// Insert a record from synchronous code, returning its id.
    ///
    /// Must not be called from inside a tokio runtime; use [`Self::insert`]
    /// there.
    pub fn seed(&self, base_id: &str, table: &str, fields: Map<String, Value>) -> String {
        let record = new_record(fields);
        let id = record.id.clone();
        self.tables
            .blocking_write()
            .entry(table_key(base_id, table))
            .or_default()
            .push(record);
        id
    }

    pub async fn insert(&self, base_id: &str, table: &str, fields: Map<String, Value>) -> String {
        let record = new_record(fields);
        let id = record.id.clone();
        self.tables
            .write()
            .await
            .entry(table_key(base_id, table))
            .or_default()
            .push(record);
        id
    }

    /// Requests received so far, including rejected ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn admit(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let expected = format!("Bearer {}", self.api_key);
        match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Authentication required",
            )),
        }
    }
}

pub fn app(db: Db) -> Router {
    Router::new()
        .route("/v0/{base_id}/{table}", get(list_records).post(create_records))
        .route("/v0/{base_id}/{table}/{record_id}", put(update_record))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

/// Airtable-shaped error: `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn unprocessable(kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, kind, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({"error": {"type": self.kind, "message": self.message}});
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page_size: Option<usize>,
    pub offset: Option<String>,
    pub max_records: Option<usize>,
    pub filter_by_formula: Option<String>,
    pub cell_format: Option<String>,
    pub time_zone: Option<String>,
    pub user_locale: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRecords {
    pub records: Vec<NewRecord>,
}

#[derive(Deserialize)]
pub struct NewRecord {
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct UpdateRecord {
    pub fields: Map<String, Value>,
}

async fn list_records(
    State(db): State<Db>,
    Path((base_id, table)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    db.admit(&headers)?;

    let page_size = query.page_size.unwrap_or(MAX_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ApiError::unprocessable(
            "INVALID_PAGE_SIZE",
            format!("pageSize must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    let as_string = string_cells(&query)?;
    let filter = query
        .filter_by_formula
        .as_deref()
        .map(Filter::parse)
        .transpose()
        .map_err(|e| ApiError::unprocessable("INVALID_FILTER_BY_FORMULA", e))?;
    let start = match query.offset.as_deref() {
        None => 0,
        Some(offset) => parse_offset(offset).ok_or_else(|| {
            ApiError::unprocessable("LIST_RECORDS_ITERATOR_NOT_AVAILABLE", "invalid offset")
        })?,
    };

    let tables = db.tables.read().await;
    let matched: Vec<&StoredRecord> = tables
        .get(&table_key(&base_id, &table))
        .into_iter()
        .flatten()
        .filter(|r| filter.as_ref().map_or(true, |f| f.matches(&r.fields)))
        .take(query.max_records.unwrap_or(usize::MAX))
        .collect();

    let end = start.saturating_add(page_size).min(matched.len());
    let page: Vec<Value> = matched
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|r| render(r, as_string))
        .collect();
    debug!(%table, start, returned = page.len(), total = matched.len(), "listed records");

    let mut body = json!({ "records": page });
    if end < matched.len() {
        body["offset"] = Value::String(format!("itr{end}"));
    }
    Ok(Json(body))
}

async fn create_records(
    State(db): State<Db>,
    Path((base_id, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<CreateRecords>,
) -> Result<Json<Value>, ApiError> {
    db.admit(&headers)?;
    if input.records.is_empty() || input.records.len() > MAX_RECORDS_PER_WRITE {
        return Err(ApiError::unprocessable(
            "INVALID_RECORDS",
            format!("between 1 and {MAX_RECORDS_PER_WRITE} records per request"),
        ));
    }

    let created: Vec<StoredRecord> = input.records.into_iter().map(|r| new_record(r.fields)).collect();
    db.tables
        .write()
        .await
        .entry(table_key(&base_id, &table))
        .or_default()
        .extend(created.iter().cloned());
    debug!(%table, count = created.len(), "created records");

    let records: Vec<Value> = created.iter().map(|r| render(r, false)).collect();
    Ok(Json(json!({ "records": records })))
}

async fn update_record(
    State(db): State<Db>,
    Path((base_id, table, record_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(input): Json<UpdateRecord>,
) -> Result<Json<Value>, ApiError> {
    db.admit(&headers)?;
    let mut tables = db.tables.write().await;
    let record = tables
        .get_mut(&table_key(&base_id, &table))
        .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Could not find record"))?;
    record.fields = input.fields;
    Ok(Json(render(record, false)))
}

/// Whether cells should be rendered as strings; `cellFormat=string` needs
/// both `timeZone` and `userLocale`.
fn string_cells(query: &ListQuery) -> Result<bool, ApiError> {
    match query.cell_format.as_deref() {
        None | Some("json") => Ok(false),
        Some("string") if query.time_zone.is_some() && query.user_locale.is_some() => Ok(true),
        Some("string") => Err(ApiError::unprocessable(
            "INVALID_REQUEST_UNKNOWN",
            "timeZone and userLocale are required when cellFormat is string",
        )),
        Some(other) => Err(ApiError::unprocessable(
            "INVALID_REQUEST_UNKNOWN",
            format!("unknown cellFormat `{other}`"),
        )),
    }
}

fn parse_offset(offset: &str) -> Option<usize> {
    offset.strip_prefix("itr")?.parse().ok()
}

fn render(record: &StoredRecord, as_string: bool) -> Value {
    let fields: Map<String, Value> = if as_string {
        record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(cell_text(v))))
            .collect()
    } else {
        record.fields.clone()
    };
    json!({
        "id": record.id,
        "createdTime": "2024-01-01T00:00:00.000Z",
        "fields": fields,
    })
}

fn new_record(fields: Map<String, Value>) -> StoredRecord {
    let suffix = Uuid::new_v4().simple().to_string();
    StoredRecord {
        id: format!("rec{}", &suffix[..14]),
        fields,
    }
}

fn table_key(base_id: &str, table: &str) -> String {
    format!("{base_id}/{table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn new_record_ids_look_like_airtable_ids() {
        let record = new_record(Map::new());
        assert!(record.id.starts_with("rec"));
        assert_eq!(record.id.len(), 17);
        assert_ne!(record.id, new_record(Map::new()).id);
    }

    #[test]
    fn offset_roundtrips_through_cursor_format() {
        assert_eq!(parse_offset("itr0"), Some(0));
        assert_eq!(parse_offset("itr250"), Some(250));
        assert_eq!(parse_offset("rec123"), None);
        assert_eq!(parse_offset("itr-1"), None);
    }

    #[test]
    fn render_as_string_stringifies_cells() {
        let record = StoredRecord {
            id: "rec1".to_string(),
            fields: fields(json!({"n": 3, "tags": ["a", "b"], "name": "x"})),
        };
        let rendered = render(&record, true);
        assert_eq!(rendered["fields"], json!({"n": "3", "tags": "a, b", "name": "x"}));
        assert_eq!(render(&record, false)["fields"]["n"], 3);
    }

    #[test]
    fn string_cells_requires_locale_and_zone() {
        let query = ListQuery {
            cell_format: Some("string".to_string()),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        };
        assert!(string_cells(&query).is_err());
        let query = ListQuery {
            user_locale: Some("en-gb".to_string()),
            ..query
        };
        assert!(string_cells(&query).unwrap());
        assert!(!string_cells(&ListQuery::default()).unwrap());
    }

    #[test]
    fn seed_counts_as_no_request() {
        let db = MockAirtable::new("key");
        let id = db.seed("app", "Table", fields(json!({"a": 1})));
        assert!(id.starts_with("rec"));
        assert_eq!(db.request_count(), 0);
    }
}
