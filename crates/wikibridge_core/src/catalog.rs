use serde_json::{Value, json};

use crate::tools::{
    DEFAULT_EDITOR, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, MIN_QUERY_CHARS, ToolName,
};

const LOCALE_DESCRIPTION: &str =
    "Locale code; defaults to the configured locale (WIKIJS_DEFAULT_LOCALE, en when unset)";

/// Descriptors advertised through `tools/list`.
pub fn tool_catalog() -> Value {
    let identity = json!({
        "id":     { "type": "integer", "minimum": 1, "description": "Numeric page id" },
        "path":   { "type": "string", "description": "Page path, e.g. docs/install (used when id is omitted)" },
        "locale": { "type": "string", "description": LOCALE_DESCRIPTION }
    });
    let with_identity = |extra: Value| {
        let mut properties = identity.clone();
        if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
            target.extend(extra);
        }
        properties
    };

    json!([
        {
            "name": ToolName::Create.as_str(),
            "description": "Create a new wiki page. Not idempotent: fails if a page already exists at the path and locale.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path":        { "type": "string", "description": "Page path without leading slash" },
                    "title":       { "type": "string" },
                    "content":     { "type": "string", "description": "Page body (markdown or HTML)" },
                    "description": { "type": "string", "description": "Short page summary" },
                    "locale":      { "type": "string", "description": LOCALE_DESCRIPTION },
                    "editor":      { "type": "string", "default": DEFAULT_EDITOR },
                    "published":   { "type": "boolean", "default": true },
                    "private":     { "type": "boolean", "default": false },
                    "tags":        { "type": "array", "items": { "type": "string" }, "default": [] }
                },
                "required": ["path", "title", "content", "description"]
            },
            "annotations": { "readOnlyHint": false, "destructiveHint": false, "idempotentHint": false }
        },
        {
            "name": ToolName::Read.as_str(),
            "description": "Read a wiki page by id or by path and locale. Long content is truncated for display.",
            "inputSchema": { "type": "object", "properties": identity },
            "annotations": { "readOnlyHint": true, "idempotentHint": true }
        },
        {
            "name": ToolName::Update.as_str(),
            "description": "Update a wiki page. Omitted fields are left unchanged; tags: [] clears all tags.",
            "inputSchema": {
                "type": "object",
                "properties": with_identity(json!({
                    "content":     { "type": "string" },
                    "title":       { "type": "string" },
                    "description": { "type": "string" },
                    "published":   { "type": "boolean" },
                    "tags":        { "type": "array", "items": { "type": "string" } }
                }))
            },
            "annotations": { "readOnlyHint": false, "destructiveHint": false, "idempotentHint": true }
        },
        {
            "name": ToolName::Delete.as_str(),
            "description": "Permanently delete a wiki page by id or by path and locale. This cannot be undone.",
            "inputSchema": { "type": "object", "properties": identity },
            "annotations": { "readOnlyHint": false, "destructiveHint": true, "idempotentHint": false }
        },
        {
            "name": ToolName::List.as_str(),
            "description": "List wiki pages with offset pagination, optionally filtered by locale.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "locale": { "type": "string" },
                    "limit":  { "type": "integer", "minimum": 1, "maximum": MAX_LIST_LIMIT, "default": DEFAULT_LIST_LIMIT },
                    "offset": { "type": "integer", "minimum": 0, "default": 0 }
                }
            },
            "annotations": { "readOnlyHint": true, "idempotentHint": true }
        },
        {
            "name": ToolName::Search.as_str(),
            "description": "Full-text search across wiki pages, optionally restricted to one locale.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query":  { "type": "string", "minLength": MIN_QUERY_CHARS },
                    "locale": { "type": "string" }
                },
                "required": ["query"]
            },
            "annotations": { "readOnlyHint": true, "idempotentHint": true }
        },
        {
            "name": ToolName::Move.as_str(),
            "description": "Move a wiki page to a new path and locale. The page id is kept.",
            "inputSchema": {
                "type": "object",
                "properties": with_identity(json!({
                    "destinationPath":   { "type": "string" },
                    "destinationLocale": { "type": "string", "description": LOCALE_DESCRIPTION }
                })),
                "required": ["destinationPath"]
            },
            "annotations": { "readOnlyHint": false, "destructiveHint": false, "idempotentHint": true }
        }
    ])
}
