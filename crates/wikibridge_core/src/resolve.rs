use crate::error::{ToolError, ToolResult};
use crate::gateway::WikiApi;
use crate::model::{PageLocator, ResolvedPage};

/// Fail fast when neither an id nor a path was supplied. No network call.
pub fn require_identity(locator: &PageLocator) -> ToolResult<()> {
    if locator.id.is_none() && locator.path.is_none() {
        return Err(ToolError::InvalidArgument(
            "either id or path must be provided".to_string(),
        ));
    }
    Ok(())
}

/// Resolve a locator to a numeric id.
///
/// An explicit id is trusted as-is and nothing is fetched. A path is looked
/// up under its locale and the fetched page is handed back so callers can
/// reuse it instead of fetching again.
pub fn resolve_page<A: WikiApi>(api: &mut A, locator: &PageLocator) -> ToolResult<ResolvedPage> {
    require_identity(locator)?;

    if let Some(id) = locator.id {
        return Ok(ResolvedPage { id, page: None });
    }

    let path = locator.path.as_deref().unwrap_or_default();
    let page = api
        .fetch_page_by_path(path, &locator.locale)?
        .ok_or_else(|| ToolError::not_found_path(path, &locator.locale))?;
    tracing::debug!(path, locale = %locator.locale, id = page.id, "resolved page path");
    Ok(ResolvedPage {
        id: page.id,
        page: Some(page),
    })
}
