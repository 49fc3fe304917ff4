use itertools::Itertools;

use crate::records::ZapRecord;

/// Current search/filter inputs. Created at view mount, mutated on every
/// input change, discarded with the view. Never persisted.
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    pub pseudo_query: String,
    pub presentation_query: String,
    pub styles: Vec<String>,
    pub instruments: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagField {
    Styles,
    Instruments,
    Roles,
}

fn tags(record: &ZapRecord, field: TagField) -> &[String] {
    match field {
        TagField::Styles => &record.styles,
        TagField::Instruments => &record.instruments,
        TagField::Roles => &record.roles,
    }
}

fn selected(state: &FilterState, field: TagField) -> &[String] {
    match field {
        TagField::Styles => &state.styles,
        TagField::Instruments => &state.instruments,
        TagField::Roles => &state.roles,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// No selection passes everything; otherwise at least one selected value must
// appear in the record's tags. OR within a field, AND across fields.
fn tag_selection_matches(selection: &[String], tags: &[String]) -> bool {
    selection.is_empty() || selection.iter().any(|s| tags.contains(s))
}

pub fn record_matches(record: &ZapRecord, state: &FilterState) -> bool {
    contains_ci(&record.pseudo, &state.pseudo_query)
        && contains_ci(&record.presentation, &state.presentation_query)
        && tag_selection_matches(&state.styles, &record.styles)
        && tag_selection_matches(&state.instruments, &record.instruments)
        && tag_selection_matches(&state.roles, &record.roles)
}

/// Pure recomputation of the filtered subset; invoked on every input change.
pub fn apply_filters(records: &[ZapRecord], state: &FilterState) -> Vec<ZapRecord> {
    records
        .iter()
        .filter(|r| record_matches(r, state))
        .cloned()
        .collect()
}

/// Selectable options for one tag field: the union over the ENTIRE loaded
/// record set, not the filtered subset, so narrowing never hides options.
pub fn tag_options(records: &[ZapRecord], field: TagField) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| tags(r, field).iter().cloned())
        .unique()
        .collect()
}
