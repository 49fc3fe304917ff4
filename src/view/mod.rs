pub mod filters;

use thiserror::Error;

use crate::records::ZapRecord;
use self::filters::{FilterState, TagField};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("record load request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    #[error("record endpoint responded with status {status}")]
    Status { status: u16 },

    #[error("record payload was malformed: {source}")]
    Payload {
        #[source]
        source: reqwest::Error,
    },
}

/// Loading until the one initial fetch settles; Loaded on success,
/// LoadedEmpty on failure. Filtering never transitions state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    LoadedEmpty,
}

/// Handed out at mount; a load result is only applied while the ticket's
/// generation still matches the view. Unmounting invalidates it.
#[derive(Clone, Copy, Debug)]
pub struct LoadTicket {
    generation: u64,
}

/// The table view model: the full record set, the current inputs and the
/// derived filtered subset. Rendering consumes it; it never renders itself.
pub struct FilterView {
    load: LoadState,
    generation: u64,
    records: Vec<ZapRecord>,
    filtered: Vec<ZapRecord>,
    filter: FilterState,
}

impl FilterView {
    pub fn mount() -> (Self, LoadTicket) {
        let view = Self {
            load: LoadState::Loading,
            generation: 0,
            records: Vec::new(),
            filtered: Vec::new(),
            filter: FilterState::default(),
        };
        let ticket = LoadTicket { generation: 0 };
        (view, ticket)
    }

    pub fn unmount(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Applies the settled fetch. A stale ticket (view unmounted in the
    /// meantime) is a no-op. Failure logs and leaves an empty table; there
    /// is no retry and no user-facing error mode beyond "no data".
    pub fn apply_load(&mut self, ticket: LoadTicket, result: Result<Vec<ZapRecord>, LoadError>) {
        if ticket.generation != self.generation {
            return;
        }
        match result {
            Ok(records) => {
                self.records = records;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load records");
                self.records = Vec::new();
                self.load = LoadState::LoadedEmpty;
            }
        }
        self.recompute();
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    pub fn set_pseudo_query(&mut self, query: impl Into<String>) {
        self.filter.pseudo_query = query.into();
        self.recompute();
    }

    pub fn set_presentation_query(&mut self, query: impl Into<String>) {
        self.filter.presentation_query = query.into();
        self.recompute();
    }

    pub fn set_selected(&mut self, field: TagField, values: Vec<String>) {
        match field {
            TagField::Styles => self.filter.styles = values,
            TagField::Instruments => self.filter.instruments = values,
            TagField::Roles => self.filter.roles = values,
        }
        self.recompute();
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn records(&self) -> &[ZapRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[ZapRecord] {
        &self.filtered
    }

    /// Options always derive from the full loaded set, never the subset.
    pub fn options(&self, field: TagField) -> Vec<String> {
        filters::tag_options(&self.records, field)
    }

    fn recompute(&mut self) {
        self.filtered = filters::apply_filters(&self.records, &self.filter);
    }
}

/// One fetch of the backend endpoint. Non-success status and transport
/// failure are both errors; the view treats them identically.
pub async fn load_records(
    client: &reqwest::Client,
    server_url: &str,
) -> Result<Vec<ZapRecord>, LoadError> {
    let url = format!("{}/api/zap-records", server_url.trim_end_matches('/'));
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LoadError::Request { source: e })?;
    if !response.status().is_success() {
        return Err(LoadError::Status {
            status: response.status().as_u16(),
        });
    }
    response
        .json::<Vec<ZapRecord>>()
        .await
        .map_err(|e| LoadError::Payload { source: e })
}

/// Drives the initial load end to end: fetch, then apply under the ticket.
pub async fn run_load(
    view: &mut FilterView,
    ticket: LoadTicket,
    client: &reqwest::Client,
    server_url: &str,
) {
    let result = load_records(client, server_url).await;
    view.apply_load(ticket, result);
}
