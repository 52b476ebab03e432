//! Record DTOs and per-call query options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column name to cell value, as Airtable returns it.
pub type Fields = Map<String, Value>;

/// One row of an Airtable table.
///
/// Keys other than `id` and `fields` (such as `createdTime`) are ignored
/// when decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

/// One decoded page of a list or filter query.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<Record>,
    /// Cursor for the next page; absent on the last page.
    #[serde(default)]
    pub offset: Option<String>,
}

/// How Airtable renders cell values in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFormat {
    #[default]
    Json,
    String,
}

/// A cell format together with the settings it depends on.
///
/// `String` rendering needs a time zone and a user locale; values of this
/// type are only constructible with both present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellFormatOptions {
    string_format: Option<StringFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StringFormat {
    time_zone: String,
    user_locale: String,
}

impl CellFormatOptions {
    /// Structured JSON cells, the service default.
    pub fn json() -> Self {
        Self::default()
    }

    /// Locale-formatted string cells.
    pub fn string(time_zone: impl Into<String>, user_locale: impl Into<String>) -> Self {
        let time_zone: String = time_zone.into();
        let user_locale: String = user_locale.into();
        Self::new(CellFormat::String, Some(time_zone.as_str()), Some(user_locale.as_str()))
    }

    /// Build options from loose parts.
    ///
    /// # Panics
    /// If `cell_format` is `String` and either `time_zone` or `user_locale`
    /// is missing or empty. This is a caller bug, not a service condition.
    pub fn new(cell_format: CellFormat, time_zone: Option<&str>, user_locale: Option<&str>) -> Self {
        match cell_format {
            CellFormat::Json => Self::default(),
            CellFormat::String => {
                let time_zone = time_zone.filter(|s| !s.is_empty());
                let user_locale = user_locale.filter(|s| !s.is_empty());
                match (time_zone, user_locale) {
                    (Some(tz), Some(locale)) => Self {
                        string_format: Some(StringFormat {
                            time_zone: tz.to_string(),
                            user_locale: locale.to_string(),
                        }),
                    },
                    _ => panic!("time_zone and user_locale are required if cell_format is string"),
                }
            }
        }
    }

    pub fn cell_format(&self) -> CellFormat {
        match self.string_format {
            Some(_) => CellFormat::String,
            None => CellFormat::Json,
        }
    }

    /// Query parameters for this format, already paired as `(name, value)`.
    ///
    /// Empty for JSON, since that is what the service does by default.
    pub(crate) fn query_params(&self) -> Vec<(&'static str, &str)> {
        match &self.string_format {
            Some(fmt) => vec![
                ("cellFormat", "string"),
                ("timeZone", fmt.time_zone.as_str()),
                ("userLocale", fmt.user_locale.as_str()),
            ],
            None => Vec::new(),
        }
    }
}

/// Paging and rendering options shared by the listing operations.
///
/// [`ListParams::new`] asks for pages of 100, the default for
/// `list_records`. [`ListParams::unpaged`] sends no `pageSize`, the default
/// for `get_records_by_fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page_size: Option<u32>,
    pub offset: Option<String>,
    pub max_records: Option<u32>,
    pub cell_format: CellFormatOptions,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page_size: Some(100),
            offset: None,
            max_records: None,
            cell_format: CellFormatOptions::default(),
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// No `pageSize`; the service picks the page size.
    pub fn unpaged() -> Self {
        Self::default().without_page_size()
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Leave the page size to the service.
    pub fn without_page_size(mut self) -> Self {
        self.page_size = None;
        self
    }

    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn max_records(mut self, max_records: u32) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn cell_format(mut self, cell_format: CellFormatOptions) -> Self {
        self.cell_format = cell_format;
        self
    }

    /// `maxRecords`, `pageSize`, `offset`, then cell-format parameters.
    ///
    /// `offset` overrides `self.offset`; pagination substitutes the cursor
    /// returned by the previous page there.
    pub(crate) fn query_params(&self, offset: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(max) = self.max_records {
            params.push(("maxRecords", max.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(offset) = offset.or(self.offset.as_deref()) {
            params.push(("offset", offset.to_string()));
        }
        params.extend(
            self.cell_format
                .query_params()
                .into_iter()
                .map(|(k, v)| (k, v.to_string())),
        );
        params
    }
}
