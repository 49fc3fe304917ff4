use std::time::Duration;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::config::SourceConfig;
use crate::records::{self, ZapRecord};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build http client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid record source url: {url}")]
    BadUrl { url: String },

    #[error("record source request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    #[error("record source responded with status {status}")]
    Status { status: u16 },

    #[error("record source payload was malformed: {source}")]
    Payload {
        #[source]
        source: reqwest::Error,
    },
}

/// One raw row as the source returns it: an opaque id and a loosely-typed
/// field bag keyed by source column name.
#[derive(Clone, Debug, Deserialize)]
pub struct RawRow {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    records: Vec<RawRow>,
    offset: Option<String>,
}

/// A paginated supplier of raw rows. The normalizer depends on nothing else:
/// pages in encounter order, `None` on completion, an error channel.
pub trait RecordPageSource {
    async fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, SourceError>;
}

pub fn build_client(timeout_seconds: u64) -> Result<reqwest::Client, SourceError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static("zapdir"),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| SourceError::Client { source: e })
}

/// Production source: the Airtable-style REST API over the configured base,
/// table and view, selecting only the mapped columns. The `offset` token in
/// a page body is the continuation cursor; its absence signals completion.
pub struct TableSource {
    client: reqwest::Client,
    config: SourceConfig,
    offset: Option<String>,
    exhausted: bool,
}

impl TableSource {
    pub fn new(client: reqwest::Client, config: SourceConfig) -> Self {
        Self {
            client,
            config,
            offset: None,
            exhausted: false,
        }
    }

    fn page_url(&self) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(&self.config.api_url).map_err(|_| SourceError::BadUrl {
            url: self.config.api_url.clone(),
        })?;
        url.path_segments_mut()
            .map_err(|_| SourceError::BadUrl {
                url: self.config.api_url.clone(),
            })?
            .push(&self.config.base_id)
            .push(&self.config.table);
        Ok(url)
    }
}

impl RecordPageSource for TableSource {
    async fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, SourceError> {
        if self.exhausted {
            return Ok(None);
        }

        let url = self.page_url()?;
        let mut request = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .query(&[("view", self.config.view.as_str())]);
        for column in records::source_columns() {
            request = request.query(&[("fields[]", column)]);
        }
        if let Some(offset) = self.offset.as_deref() {
            request = request.query(&[("offset", offset)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Request { source: e })?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
            });
        }

        let body: PageBody = response
            .json()
            .await
            .map_err(|e| SourceError::Payload { source: e })?;

        self.offset = body.offset;
        if self.offset.is_none() {
            self.exhausted = true;
        }
        Ok(Some(body.records))
    }
}

/// Drains the source and normalizes every row in encounter order. Any page
/// error aborts the whole fetch; the caller never sees a partial set.
pub async fn fetch_all_records<S: RecordPageSource>(
    source: &mut S,
) -> Result<Vec<ZapRecord>, SourceError> {
    let mut out: Vec<ZapRecord> = Vec::new();
    while let Some(rows) = source.next_page().await? {
        for row in rows.iter() {
            out.push(records::normalize_fields(&row.fields));
        }
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory source used across the test suite: a scripted sequence of
    /// page results, then completion.
    pub struct ScriptedSource {
        pages: VecDeque<Result<Vec<RawRow>, SourceError>>,
    }

    impl ScriptedSource {
        pub fn new(pages: Vec<Result<Vec<RawRow>, SourceError>>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
            }
        }
    }

    impl RecordPageSource for ScriptedSource {
        async fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, SourceError> {
            match self.pages.pop_front() {
                Some(Ok(rows)) => Ok(Some(rows)),
                Some(Err(e)) => Err(e),
                None => Ok(None),
            }
        }
    }

    pub fn row(id: &str, fields: Value) -> RawRow {
        let fields = match fields {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        };
        RawRow {
            id: id.to_string(),
            fields,
        }
    }
}
