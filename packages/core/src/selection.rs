//! Accept/reject bookkeeping for selection-list candidates.
//!
//! A candidate lives in a [`SelectionList`] block until the user decides on
//! it. This module only records the decision; moving an accepted candidate
//! into the flowing text is up to the surrounding application.

use crate::error::EngineError;
use crate::types::{Block, Candidate, Document, SelectionList};

/// Set the decision flags of the candidate `entity_id` in `list`.
///
/// Exactly one candidate changes. Everything else in the list, including the
/// candidate's own other fields, is carried over as is.
pub fn update_candidate(
    list: &SelectionList,
    entity_id: &str,
    deleted: bool,
    confirmed: bool,
) -> Result<SelectionList, EngineError> {
    let mut out = list.clone();
    let candidate = out
        .entities
        .iter_mut()
        .find(|c| c.entity_id == entity_id)
        .ok_or_else(|| EngineError::CandidateNotFound(entity_id.to_string()))?;
    candidate.deleted = deleted;
    candidate.confirmed = confirmed;
    Ok(out)
}

/// Apply [`update_candidate`] to the first selection list in `doc` that holds
/// `entity_id`.
pub fn update_candidate_in(
    doc: &Document,
    entity_id: &str,
    deleted: bool,
    confirmed: bool,
) -> Result<Document, EngineError> {
    let mut out = doc.clone();
    for block in out.content.iter_mut() {
        if let Block::SelectionList(list) = block {
            if list.entities.iter().any(|c| c.entity_id == entity_id) {
                *list = update_candidate(list, entity_id, deleted, confirmed)?;
                return Ok(out);
            }
        }
    }
    Err(EngineError::CandidateNotFound(entity_id.to_string()))
}

/// Every candidate in `doc`, in document order.
///
/// Legacy list shapes are rewritten by the sanitizer before a tree becomes a
/// [`Document`], so this sees both representations. For raw JSON that has not
/// been sanitized yet, use [`candidates_in_raw`](crate::sanitize::candidates_in_raw).
pub fn find_candidates(doc: &Document) -> Vec<&Candidate> {
    doc.selection_lists()
        .flat_map(|l| l.entities.iter())
        .collect()
}

/// Candidates that are confirmed and not deleted.
pub fn accepted_candidates(doc: &Document) -> Vec<&Candidate> {
    find_candidates(doc)
        .into_iter()
        .filter(|c| c.is_accepted())
        .collect()
}

// --- tests -------------------------------------------------------------------
