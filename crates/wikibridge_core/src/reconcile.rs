//! Partial page updates.
//!
//! The remote `pages.update` mutation clears `content` and `tags` when they
//! are omitted, while `title`, `description` and `isPublished` are kept. To
//! make "not mentioned" mean "unchanged" for the caller, omitted content and
//! tags are backfilled from the page's current state before submitting.

use crate::error::{ToolError, ToolResult};
use crate::gateway::WikiApi;
use crate::model::{Field, MutationOutcome, Page, PageLocator, PageUpdate};
use crate::resolve::resolve_page;

/// The caller's sparse update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIntent {
    pub locator: PageLocator,
    pub content: Field<String>,
    pub title: Field<String>,
    pub description: Field<String>,
    pub is_published: Field<bool>,
    pub tags: Field<Vec<String>>,
}

impl UpdateIntent {
    /// Wire names of the fields the caller actually supplied.
    pub fn requested_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.content.is_set() {
            fields.push("content");
        }
        if self.title.is_set() {
            fields.push("title");
        }
        if self.description.is_set() {
            fields.push("description");
        }
        if self.is_published.is_set() {
            fields.push("isPublished");
        }
        if self.tags.is_set() {
            fields.push("tags");
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledUpdate {
    pub update: PageUpdate,
    pub backfilled: Vec<&'static str>,
}

/// Merge `intent` with the stored page into the field set the remote needs.
///
/// Fetches happen sequentially and only for fields the caller left out.
pub fn reconcile_update<A: WikiApi>(
    api: &mut A,
    intent: &UpdateIntent,
) -> ToolResult<ReconciledUpdate> {
    let resolved = resolve_page(api, &intent.locator)?;
    let id = resolved.id;
    let mut current: Option<Page> = resolved.page;
    let mut backfilled = Vec::new();

    let content = match &intent.content {
        Field::Set(content) => content.clone(),
        Field::Unset => {
            if current.is_none() {
                current = api.fetch_page_by_id(id)?;
            }
            let page = current.as_ref().ok_or_else(|| ToolError::not_found_id(id))?;
            backfilled.push("content");
            page.content.clone()
        }
    };

    let tags = match &intent.tags {
        Field::Set(tags) => tags.clone(),
        Field::Unset => {
            backfilled.push("tags");
            api.list_pages()?
                .into_iter()
                .find(|summary| summary.id == id)
                .map(|summary| summary.tags)
                .unwrap_or_default()
        }
    };

    Ok(ReconciledUpdate {
        update: PageUpdate {
            id,
            content: Field::Set(content),
            title: intent.title.clone(),
            description: intent.description.clone(),
            is_published: intent.is_published.clone(),
            tags: Field::Set(tags),
        },
        backfilled,
    })
}

/// Reconcile and submit.
pub fn apply_update<A: WikiApi>(
    api: &mut A,
    intent: &UpdateIntent,
) -> ToolResult<(ReconciledUpdate, MutationOutcome)> {
    let reconciled = reconcile_update(api, intent)?;
    tracing::debug!(
        id = reconciled.update.id,
        backfilled = ?reconciled.backfilled,
        "submitting reconciled page update"
    );
    let outcome = api.update_page(&reconciled.update)?;
    Ok((reconciled, outcome))
}
