//! Lazy iteration over paginated list responses.
//!
//! A list or filter query answers with at most one page of records plus an
//! `offset` cursor when more remain. [`Records`] hides that: it yields
//! records one by one and only requests the next page once the current one
//! has been drained and another item is asked for.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::Result;
use crate::http::HttpRequest;
use crate::types::{Record, RecordPage};

/// Where the next page comes from.
enum Cursor {
    /// Nothing fetched yet; use the caller's starting offset.
    Start,
    /// The previous page returned this offset.
    Next(String),
    /// The last page has been fetched, or an error was yielded.
    Done,
}

/// Iterator over every record of a query, across pages.
///
/// Yields `Err` at most once; the iterator is exhausted afterwards.
/// Calling the originating client method again starts a fresh sequence
/// from the first page.
pub struct Records<'a> {
    build: Box<dyn Fn(Option<&str>) -> HttpRequest + 'a>,
    fetch: Box<dyn Fn(HttpRequest) -> Result<RecordPage> + 'a>,
    buffer: VecDeque<Record>,
    cursor: Cursor,
    pages: usize,
}

impl<'a> Records<'a> {
    /// `build` produces the request for a page given the cursor to use
    /// (`None` on the first page), `fetch` executes and parses it.
    pub(crate) fn new(
        build: impl Fn(Option<&str>) -> HttpRequest + 'a,
        fetch: impl Fn(HttpRequest) -> Result<RecordPage> + 'a,
    ) -> Self {
        Self {
            build: Box::new(build),
            fetch: Box::new(fetch),
            buffer: VecDeque::new(),
            cursor: Cursor::Start,
            pages: 0,
        }
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    fn fetch_next_page(&mut self) -> Result<()> {
        let request = match &self.cursor {
            Cursor::Start => (self.build)(None),
            Cursor::Next(offset) => (self.build)(Some(offset.as_str())),
            Cursor::Done => return Ok(()),
        };
        self.pages += 1;
        let page = (self.fetch)(request)?;
        trace!(
            page = self.pages,
            records = page.records.len(),
            more = page.offset.is_some(),
            "decoded record page"
        );
        self.cursor = match page.offset {
            Some(offset) => Cursor::Next(offset),
            None => Cursor::Done,
        };
        self.buffer.extend(page.records);
        Ok(())
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if matches!(self.cursor, Cursor::Done) {
                return None;
            }
            if let Err(err) = self.fetch_next_page() {
                self.cursor = Cursor::Done;
                return Some(Err(err));
            }
        }
    }
}

impl std::iter::FusedIterator for Records<'_> {}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::AirtableError;
    use crate::http::HttpMethod;

    type Canned = RefCell<VecDeque<Result<RecordPage>>>;

    fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            fields: Default::default(),
        }
    }

    fn request(offset: Option<&str>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://test/?offset={}", offset.unwrap_or("")),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Canned pages served in request order, plus a log of urls seen.
    fn pages_from(pages: Vec<Result<RecordPage>>) -> (Canned, RefCell<Vec<String>>) {
        (RefCell::new(pages.into()), RefCell::new(Vec::new()))
    }

    #[test]
    fn follows_offsets_until_last_page() {
        let (pages, seen) = pages_from(vec![
            Ok(RecordPage {
                records: vec![record("a"), record("b")],
                offset: Some("itr2".to_string()),
            }),
            Ok(RecordPage {
                records: vec![record("c")],
                offset: None,
            }),
        ]);
        let records = Records::new(request, |req| {
            seen.borrow_mut().push(req.url);
            pages.borrow_mut().pop_front().unwrap()
        });
        let ids: Vec<String> = records.map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            *seen.borrow(),
            vec!["http://test/?offset=".to_string(), "http://test/?offset=itr2".to_string()]
        );
    }

    #[test]
    fn next_page_is_requested_lazily() {
        let (pages, seen) = pages_from(vec![Ok(RecordPage {
            records: vec![record("a"), record("b")],
            offset: Some("itr2".to_string()),
        })]);
        let mut records = Records::new(request, |req| {
            seen.borrow_mut().push(req.url);
            pages.borrow_mut().pop_front().unwrap()
        });
        assert_eq!(records.next().unwrap().unwrap().id, "a");
        assert_eq!(records.next().unwrap().unwrap().id, "b");
        assert_eq!(records.pages_fetched(), 1);
        drop(records);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn empty_page_with_offset_is_skipped() {
        let (pages, _) = pages_from(vec![
            Ok(RecordPage {
                records: Vec::new(),
                offset: Some("itr2".to_string()),
            }),
            Ok(RecordPage {
                records: vec![record("z")],
                offset: None,
            }),
        ]);
        let records: Vec<_> = Records::new(request, |_| pages.borrow_mut().pop_front().unwrap())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records, vec![record("z")]);
    }

    #[test]
    fn error_is_yielded_once_then_exhausted() {
        let (pages, _) = pages_from(vec![
            Ok(RecordPage {
                records: vec![record("a")],
                offset: Some("itr2".to_string()),
            }),
            Err(AirtableError::Api {
                status: 500,
                body: String::new(),
            }),
        ]);
        let mut records = Records::new(request, |_| pages.borrow_mut().pop_front().unwrap());
        assert!(records.next().unwrap().is_ok());
        assert!(matches!(
            records.next(),
            Some(Err(AirtableError::Api { status: 500, .. }))
        ));
        assert!(records.next().is_none());
        assert!(records.next().is_none());
        assert_eq!(records.pages_fetched(), 2);
    }
}
