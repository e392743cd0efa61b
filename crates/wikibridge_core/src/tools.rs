use std::time::Instant;

use serde_json::{Value, json};

use crate::args::{ArgReader, dedupe_tags};
use crate::config::ToolSettings;
use crate::envelope::Envelope;
use crate::error::{ToolError, ToolResult};
use crate::gateway::WikiApi;
use crate::model::{Field, NewPage, Page, PageLocator};
use crate::reconcile::{UpdateIntent, apply_update};
use crate::resolve::{require_identity, resolve_page};

pub const DEFAULT_EDITOR: &str = "markdown";
pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Create,
    Read,
    Update,
    Delete,
    List,
    Search,
    Move,
}

impl ToolName {
    pub const ALL: [ToolName; 7] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::List,
        Self::Search,
        Self::Move,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create_page",
            Self::Read => "read_page",
            Self::Update => "update_page",
            Self::Delete => "delete_page",
            Self::List => "list_pages",
            Self::Search => "search_pages",
            Self::Move => "move_page",
        }
    }
}

/// Run one tool call to completion. Never fails: errors become failure envelopes.
pub fn dispatch<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    tool: &str,
    arguments: &Value,
) -> Envelope {
    let started = Instant::now();
    let result = match ToolName::parse(tool) {
        Some(name) => run_tool(api, settings, name, arguments),
        None => Err(ToolError::InvalidArgument(format!("unknown tool: {tool}"))),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(payload) => {
            tracing::info!(tool, elapsed_ms, "tool call succeeded");
            Envelope::success(payload)
        }
        Err(error) => {
            tracing::warn!(tool, elapsed_ms, kind = error.kind(), "tool call failed: {error}");
            Envelope::failure(tool, &error)
        }
    }
}

fn run_tool<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    name: ToolName,
    arguments: &Value,
) -> ToolResult<Value> {
    match name {
        ToolName::Create => create_page(api, settings, arguments),
        ToolName::Read => read_page(api, settings, arguments),
        ToolName::Update => update_page(api, settings, arguments),
        ToolName::Delete => delete_page(api, settings, arguments),
        ToolName::List => list_pages(api, arguments),
        ToolName::Search => search_pages(api, arguments),
        ToolName::Move => move_page(api, settings, arguments),
    }
}

fn read_locator(reader: &mut ArgReader<'_>, settings: &ToolSettings) -> PageLocator {
    let id = reader.optional_int("id", 1, i64::MAX).into_option();
    let path = reader.optional_text("path").into_option();
    let locale = reader
        .optional_text("locale")
        .into_option()
        .unwrap_or_else(|| settings.default_locale.clone());
    PageLocator { id, path, locale }
}

pub fn create_page<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    arguments: &Value,
) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let path = reader.required_text("path");
    let title = reader.required_text("title");
    let content = reader.required_string("content");
    let description = reader.required_string("description");
    let locale = reader.optional_text("locale").into_option();
    let editor = reader.optional_text("editor").into_option();
    let is_published = reader.optional_bool("published").into_option();
    let is_private = reader.optional_bool("private").into_option();
    let tags = reader.optional_string_list("tags").into_option();
    reader.finish()?;

    let (Some(path), Some(title), Some(content), Some(description)) =
        (path, title, content, description)
    else {
        return Err(ToolError::InvalidArgument(
            "path, title, content and description are required".to_string(),
        ));
    };

    let new_page = NewPage {
        path: normalize_path(&path),
        locale: locale.unwrap_or_else(|| settings.default_locale.clone()),
        title,
        content,
        description,
        editor: editor.unwrap_or_else(|| DEFAULT_EDITOR.to_string()),
        is_published: is_published.unwrap_or(true),
        is_private: is_private.unwrap_or(false),
        tags: dedupe_tags(tags.unwrap_or_default()),
    };
    let outcome = api.create_page(&new_page)?;

    Ok(json!({
        "message": outcome.message.unwrap_or_else(|| "Page created".to_string()),
        "page": outcome.page,
        "path": new_page.path,
        "locale": new_page.locale,
    }))
}

pub fn read_page<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    arguments: &Value,
) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let locator = read_locator(&mut reader, settings);
    reader.finish()?;
    require_identity(&locator)?;

    let resolved = resolve_page(api, &locator)?;
    let page = match resolved.page {
        Some(page) => page,
        None => api
            .fetch_page_by_id(resolved.id)?
            .ok_or_else(|| ToolError::not_found_id(resolved.id))?,
    };

    let (page, truncated) = truncate_for_display(page, settings.max_content_chars);
    Ok(json!({ "page": page, "truncated": truncated }))
}

/// Cut content to `max_chars` characters and append a notice with the full length.
pub fn truncate_for_display(mut page: Page, max_chars: usize) -> (Page, bool) {
    let total = page.content.chars().count();
    if total <= max_chars {
        return (page, false);
    }
    let mut shortened: String = page.content.chars().take(max_chars).collect();
    shortened.push_str(&truncation_notice(max_chars, total));
    page.content = shortened;
    (page, true)
}

pub fn truncation_notice(shown: usize, total: usize) -> String {
    format!("\n\n[Content truncated: showing the first {shown} of {total} characters]")
}

pub fn update_page<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    arguments: &Value,
) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let locator = read_locator(&mut reader, settings);
    let content = reader.optional_string("content");
    let title = reader.optional_string("title");
    let description = reader.optional_string("description");
    let is_published = reader.optional_bool("published");
    let tags = match reader.optional_string_list("tags") {
        Field::Set(tags) => Field::Set(dedupe_tags(tags)),
        Field::Unset => Field::Unset,
    };
    reader.finish()?;
    require_identity(&locator)?;

    let intent = UpdateIntent {
        locator,
        content,
        title,
        description,
        is_published,
        tags,
    };
    let requested = intent.requested_fields();
    let (reconciled, outcome) = apply_update(api, &intent)?;

    Ok(json!({
        "message": outcome.message.unwrap_or_else(|| "Page updated".to_string()),
        "id": reconciled.update.id,
        "updatedFields": requested,
        "preservedFields": reconciled.backfilled,
        "page": outcome.page,
    }))
}

pub fn delete_page<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    arguments: &Value,
) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let locator = read_locator(&mut reader, settings);
    reader.finish()?;
    require_identity(&locator)?;

    let resolved = resolve_page(api, &locator)?;
    let outcome = api.delete_page(resolved.id)?;
    Ok(json!({
        "message": outcome.message.unwrap_or_else(|| "Page deleted".to_string()),
        "id": resolved.id,
    }))
}

pub fn list_pages<A: WikiApi>(api: &mut A, arguments: &Value) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let locale = reader.optional_text("locale").into_option();
    let limit = reader
        .optional_int("limit", 1, MAX_LIST_LIMIT)
        .into_option()
        .unwrap_or(DEFAULT_LIST_LIMIT);
    let offset = reader
        .optional_int("offset", 0, i64::MAX)
        .into_option()
        .unwrap_or(0);
    reader.finish()?;

    let mut pages = api.list_pages()?;
    if let Some(locale) = &locale {
        pages.retain(|page| &page.locale == locale);
    }

    let window = paginate(pages.len(), to_usize(offset), to_usize(limit));
    let slice: Vec<_> = pages
        .into_iter()
        .skip(window.start)
        .take(window.returned)
        .collect();

    let mut payload = json!({
        "pages": slice,
        "total_count": window.total,
        "returned_count": window.returned,
        "offset": window.start,
        "limit": limit,
        "has_more": window.has_more,
    });
    if let Some(next_offset) = window.next_offset {
        payload["next_offset"] = json!(next_offset);
    }
    if let Some(locale) = locale {
        payload["locale"] = json!(locale);
    }
    Ok(payload)
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Offset window over a fully fetched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub total: usize,
    pub start: usize,
    pub returned: usize,
    pub has_more: bool,
    pub next_offset: Option<usize>,
}

pub fn paginate(total: usize, offset: usize, limit: usize) -> PageWindow {
    let start = offset.min(total);
    let returned = limit.min(total - start);
    let end = start + returned;
    let has_more = end < total;
    PageWindow {
        total,
        start,
        returned,
        has_more,
        next_offset: has_more.then_some(end),
    }
}

pub fn search_pages<A: WikiApi>(api: &mut A, arguments: &Value) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let query = reader.required_string("query");
    let locale = reader.optional_text("locale").into_option();
    if let Some(query) = &query {
        reader.check(
            query.trim().chars().count() >= MIN_QUERY_CHARS,
            "query",
            "must be at least 2 characters",
        );
    }
    reader.finish()?;
    let query = query.unwrap_or_default();

    let mut response = api.search_pages(query.trim())?;
    let total_hits = match &locale {
        Some(locale) => {
            response.results.retain(|hit| &hit.locale == locale);
            i64::try_from(response.results.len()).unwrap_or(i64::MAX)
        }
        None => response.total_hits,
    };

    let mut payload = json!({
        "query": query.trim(),
        "results": response.results,
        "suggestions": response.suggestions,
        "totalHits": total_hits,
    });
    if let Some(locale) = locale {
        payload["locale"] = json!(locale);
    }
    Ok(payload)
}

pub fn move_page<A: WikiApi>(
    api: &mut A,
    settings: &ToolSettings,
    arguments: &Value,
) -> ToolResult<Value> {
    let mut reader = ArgReader::new(arguments);
    let locator = read_locator(&mut reader, settings);
    let destination_path = reader.required_text("destinationPath");
    let destination_locale = reader
        .optional_text("destinationLocale")
        .into_option()
        .unwrap_or_else(|| settings.default_locale.clone());
    reader.finish()?;
    require_identity(&locator)?;
    let destination_path = normalize_path(&destination_path.unwrap_or_default());

    let resolved = resolve_page(api, &locator)?;
    let outcome = api.move_page(resolved.id, &destination_path, &destination_locale)?;
    Ok(json!({
        "message": outcome.message.unwrap_or_else(|| "Page moved".to_string()),
        "id": resolved.id,
        "destinationPath": destination_path,
        "destinationLocale": destination_locale,
    }))
}

/// Wiki paths are stored without surrounding slashes.
fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}
