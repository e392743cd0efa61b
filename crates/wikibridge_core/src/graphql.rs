//! GraphQL documents for the Wiki.js `pages` API and helpers for the
//! `{data, errors}` / `responseResult` envelopes it answers with.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RemoteError;
use crate::model::{Field, PageUpdate};

macro_rules! response_result_selection {
    () => {
        "responseResult { succeeded errorCode slug message }"
    };
}

const RESPONSE_RESULT_SELECTION: &str = response_result_selection!();

pub const PAGE_BY_ID_QUERY: &str = r#"query PageById($id: Int!) {
  pages {
    single(id: $id) {
      id path locale title description content contentType editor
      isPublished isPrivate createdAt updatedAt
      tags { tag }
    }
  }
}"#;

pub const PAGE_BY_PATH_QUERY: &str = r#"query PageByPath($path: String!, $locale: String!) {
  pages {
    singleByPath(path: $path, locale: $locale) {
      id path locale title description content contentType editor
      isPublished isPrivate createdAt updatedAt
      tags { tag }
    }
  }
}"#;

pub const LIST_PAGES_QUERY: &str = r#"query ListPages {
  pages {
    list(orderBy: TITLE) {
      id path locale title description contentType
      isPublished isPrivate tags createdAt updatedAt
    }
  }
}"#;

pub const SEARCH_PAGES_QUERY: &str = r#"query SearchPages($query: String!) {
  pages {
    search(query: $query) {
      results { id title description path locale }
      suggestions
      totalHits
    }
  }
}"#;

pub const CREATE_PAGE_MUTATION: &str = concat!(
    "mutation CreatePage(\n",
    "  $content: String!, $description: String!, $editor: String!, $isPublished: Boolean!,\n",
    "  $isPrivate: Boolean!, $locale: String!, $path: String!, $tags: [String]!, $title: String!\n",
    ") {\n",
    "  pages {\n",
    "    create(\n",
    "      content: $content, description: $description, editor: $editor,\n",
    "      isPublished: $isPublished, isPrivate: $isPrivate, locale: $locale,\n",
    "      path: $path, tags: $tags, title: $title\n",
    "    ) {\n",
    "      ",
    response_result_selection!(),
    "\n",
    "      page { id path locale title }\n",
    "    }\n",
    "  }\n",
    "}"
);

pub const DELETE_PAGE_MUTATION: &str = concat!(
    "mutation DeletePage($id: Int!) {\n",
    "  pages {\n",
    "    delete(id: $id) {\n",
    "      ",
    response_result_selection!(),
    "\n",
    "    }\n",
    "  }\n",
    "}"
);

pub const MOVE_PAGE_MUTATION: &str = concat!(
    "mutation MovePage($id: Int!, $destinationPath: String!, $destinationLocale: String!) {\n",
    "  pages {\n",
    "    move(\n",
    "      id: $id, destinationPath: $destinationPath, destinationLocale: $destinationLocale\n",
    "    ) {\n",
    "      ",
    response_result_selection!(),
    "\n",
    "    }\n",
    "  }\n",
    "}"
);

/// One optional argument of the update mutation.
struct UpdateFieldSpec {
    wire_name: &'static str,
    type_tag: &'static str,
    value: fn(&PageUpdate) -> Field<Value>,
}

/// Statically-known argument table for `pages.update`; order is the emit order.
const UPDATE_FIELDS: &[UpdateFieldSpec] = &[
    UpdateFieldSpec {
        wire_name: "content",
        type_tag: "String",
        value: |update: &PageUpdate| string_value(&update.content),
    },
    UpdateFieldSpec {
        wire_name: "title",
        type_tag: "String",
        value: |update: &PageUpdate| string_value(&update.title),
    },
    UpdateFieldSpec {
        wire_name: "description",
        type_tag: "String",
        value: |update: &PageUpdate| string_value(&update.description),
    },
    UpdateFieldSpec {
        wire_name: "isPublished",
        type_tag: "Boolean",
        value: |update: &PageUpdate| match update.is_published {
            Field::Set(flag) => Field::Set(Value::Bool(flag)),
            Field::Unset => Field::Unset,
        },
    },
    UpdateFieldSpec {
        wire_name: "tags",
        type_tag: "[String]",
        value: |update: &PageUpdate| match &update.tags {
            Field::Set(tags) => Field::Set(Value::Array(
                tags.iter().map(|tag| Value::from(tag.as_str())).collect(),
            )),
            Field::Unset => Field::Unset,
        },
    },
];

fn string_value(field: &Field<String>) -> Field<Value> {
    match field {
        Field::Set(value) => Field::Set(Value::from(value.as_str())),
        Field::Unset => Field::Unset,
    }
}

/// A ready-to-send GraphQL request.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Value,
}

/// Build the update mutation with only the `Set` fields declared and passed.
pub fn build_update_request(update: &PageUpdate) -> GraphQlRequest {
    let mut declarations = vec!["$id: Int!".to_string()];
    let mut arguments = vec!["id: $id".to_string()];
    let mut variables = Map::new();
    variables.insert("id".to_string(), Value::from(update.id));

    for spec in UPDATE_FIELDS {
        if let Field::Set(value) = (spec.value)(update) {
            declarations.push(format!("${}: {}", spec.wire_name, spec.type_tag));
            arguments.push(format!("{0}: ${0}", spec.wire_name));
            variables.insert(spec.wire_name.to_string(), value);
        }
    }

    let query = format!(
        "mutation UpdatePage({declarations}) {{\n  pages {{\n    update({arguments}) {{\n      \
         {RESPONSE_RESULT_SELECTION}\n      page {{ id path locale title }}\n    }}\n  }}\n}}",
        declarations = declarations.join(", "),
        arguments = arguments.join(", "),
    );

    GraphQlRequest {
        query,
        variables: Value::Object(variables),
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlPayload {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    #[serde(default)]
    message: Option<String>,
}

/// Split a `{data?, errors?}` body into the data object or a [`RemoteError`].
pub fn unwrap_payload(body: Value) -> Result<Value, RemoteError> {
    let payload: GraphQlPayload =
        serde_json::from_value(body).map_err(|error| RemoteError::MalformedResponse {
            operation: "response".to_string(),
            message: error.to_string(),
        })?;

    if let Some(errors) = payload.errors
        && !errors.is_empty()
    {
        let details = errors
            .into_iter()
            .map(|item| item.message.unwrap_or_else(|| "unknown error".to_string()))
            .collect();
        return Err(RemoteError::RemoteRejected { details });
    }

    match payload.data {
        Some(Value::Null) | None => Err(RemoteError::EmptyResponse),
        Some(data) => Ok(data),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseResult {
    pub succeeded: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseResult {
    /// Turn `succeeded=false` into [`RemoteError::OperationRejected`].
    pub(crate) fn into_outcome(self, operation: &str) -> Result<Option<String>, RemoteError> {
        if self.succeeded {
            return Ok(self.message);
        }
        Err(RemoteError::OperationRejected {
            operation: operation.to_string(),
            message: self
                .message
                .unwrap_or_else(|| "operation was not successful".to_string()),
            error_code: self.error_code,
        })
    }
}

/// Walk `data.pages.<field>`; absent or null yields `None`.
pub(crate) fn pages_field<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    data.get("pages")
        .and_then(|pages| pages.get(field))
        .filter(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn update_request_emits_only_set_fields() {
        let update = PageUpdate {
            id: 7,
            is_published: Field::Set(false),
            ..PageUpdate::default()
        };
        let request = build_update_request(&update);
        assert!(request.query.contains("$id: Int!, $isPublished: Boolean"));
        assert!(request.query.contains("update(id: $id, isPublished: $isPublished)"));
        assert!(!request.query.contains("$content"));
        assert!(!request.query.contains("$tags"));
        assert_eq!(request.variables, json!({ "id": 7, "isPublished": false }));
    }

    #[test]
    fn update_request_keeps_empty_values() {
        let update = PageUpdate {
            id: 3,
            content: Field::Set(String::new()),
            tags: Field::Set(Vec::new()),
            ..PageUpdate::default()
        };
        let request = build_update_request(&update);
        assert!(request.query.contains("$content: String"));
        assert!(request.query.contains("$tags: [String]"));
        assert_eq!(
            request.variables,
            json!({ "id": 3, "content": "", "tags": [] })
        );
    }

    #[test]
    fn update_request_follows_field_table_order() {
        let update = PageUpdate {
            id: 1,
            content: Field::Set("body".to_string()),
            title: Field::Set("Title".to_string()),
            description: Field::Set("desc".to_string()),
            is_published: Field::Set(true),
            tags: Field::Set(vec!["a".to_string()]),
        };
        let request = build_update_request(&update);
        assert!(request.query.contains(concat!(
            "update(id: $id, content: $content, title: $title, ",
            "description: $description, isPublished: $isPublished, tags: $tags)"
        )));
    }

    #[test]
    fn every_mutation_selects_response_result() {
        let update = build_update_request(&PageUpdate::default());
        for document in [
            CREATE_PAGE_MUTATION,
            DELETE_PAGE_MUTATION,
            MOVE_PAGE_MUTATION,
            update.query.as_str(),
        ] {
            assert!(document.contains(RESPONSE_RESULT_SELECTION), "{document}");
        }
        assert!(MOVE_PAGE_MUTATION.contains("destinationLocale: $destinationLocale\n    ) {"));
    }

    #[test]
    fn unwrap_payload_prefers_errors_over_data() {
        let error = unwrap_payload(json!({
            "data": { "pages": null },
            "errors": [{ "message": "Forbidden" }, { "message": "Try again" }]
        }))
        .expect_err("errors must fail");
        assert_eq!(
            error,
            RemoteError::RemoteRejected {
                details: vec!["Forbidden".to_string(), "Try again".to_string()]
            }
        );
    }

    #[test]
    fn unwrap_payload_rejects_empty_body() {
        assert_eq!(unwrap_payload(json!({})), Err(RemoteError::EmptyResponse));
        assert_eq!(
            unwrap_payload(json!({ "data": null, "errors": [] })),
            Err(RemoteError::EmptyResponse)
        );
    }

    #[test]
    fn unwrap_payload_returns_data() {
        let data = unwrap_payload(json!({ "data": { "pages": { "list": [] } } })).expect("data");
        assert_eq!(pages_field(&data, "list"), Some(&json!([])));
        assert_eq!(pages_field(&data, "single"), None);
    }

    #[test]
    fn response_result_failure_carries_message() {
        let result: ResponseResult = serde_json::from_value(json!({
            "succeeded": false,
            "errorCode": 6002,
            "slug": "PageNotFound",
            "message": "This page does not exist."
        }))
        .expect("decode");
        let error = result.into_outcome("delete").expect_err("must fail");
        assert_eq!(
            error,
            RemoteError::OperationRejected {
                operation: "delete".to_string(),
                message: "This page does not exist.".to_string(),
                error_code: Some(6002),
            }
        );
    }
}
