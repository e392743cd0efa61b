use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::GatewayConfig;
use crate::error::RemoteError;
use crate::graphql::{
    self, CREATE_PAGE_MUTATION, DELETE_PAGE_MUTATION, GraphQlRequest, LIST_PAGES_QUERY,
    MOVE_PAGE_MUTATION, PAGE_BY_ID_QUERY, PAGE_BY_PATH_QUERY, ResponseResult,
    SEARCH_PAGES_QUERY,
};
use crate::model::{
    MutatedPage, MutationOutcome, NewPage, Page, PageSummary, PageUpdate, SearchHit,
    SearchResults,
};

/// Typed page operations against the remote wiki.
pub trait WikiApi {
    fn fetch_page_by_id(&mut self, id: i64) -> Result<Option<Page>, RemoteError>;
    fn fetch_page_by_path(
        &mut self,
        path: &str,
        locale: &str,
    ) -> Result<Option<Page>, RemoteError>;
    fn list_pages(&mut self) -> Result<Vec<PageSummary>, RemoteError>;
    fn search_pages(&mut self, query: &str) -> Result<SearchResults, RemoteError>;
    fn create_page(&mut self, page: &NewPage) -> Result<MutationOutcome, RemoteError>;
    fn update_page(&mut self, update: &PageUpdate) -> Result<MutationOutcome, RemoteError>;
    fn delete_page(&mut self, id: i64) -> Result<MutationOutcome, RemoteError>;
    fn move_page(
        &mut self,
        id: i64,
        destination_path: &str,
        destination_locale: &str,
    ) -> Result<MutationOutcome, RemoteError>;
    fn request_count(&self) -> usize;
}

/// Blocking GraphQL client bound to one endpoint and credential.
pub struct GraphQlClient {
    client: Client,
    config: GatewayConfig,
    request_count: usize,
}

impl GraphQlClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .context("wiki API token contains characters not allowed in a header")?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("failed to build wiki GraphQL HTTP client")?;

        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    /// Run one query or mutation and return its `data` object.
    pub fn execute(
        &mut self,
        operation: &str,
        request: &GraphQlRequest,
    ) -> Result<Value, RemoteError> {
        self.request_count += 1;
        let started = Instant::now();
        let result = self.send(request);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(_) => tracing::debug!(operation, elapsed_ms, "wiki API call succeeded"),
            Err(error) => tracing::debug!(
                operation,
                elapsed_ms,
                kind = error.kind(),
                "wiki API call failed: {error}"
            ),
        }
        result
    }

    fn send(&self, request: &GraphQlRequest) -> Result<Value, RemoteError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&json!({ "query": request.query, "variables": request.variables }))
            .send()
            .map_err(|error| self.classify_send_error(&error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: Value = response
            .json()
            .map_err(|error| self.classify_send_error(&error))?;
        graphql::unwrap_payload(body)
    }

    fn classify_send_error(&self, error: &reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            return RemoteError::Timeout {
                timeout_ms: self.config.timeout_ms,
            };
        }
        if error.is_decode() {
            return RemoteError::MalformedResponse {
                operation: "response".to_string(),
                message: error.to_string(),
            };
        }
        RemoteError::Transport {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }

    fn query<T: DeserializeOwned>(
        &mut self,
        operation: &str,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<Option<T>, RemoteError> {
        let data = self.execute(
            operation,
            &GraphQlRequest {
                query: query.to_string(),
                variables,
            },
        )?;
        graphql::pages_field(&data, field)
            .map(|value| decode(operation, value.clone()))
            .transpose()
    }

    fn mutate(
        &mut self,
        operation: &str,
        request: &GraphQlRequest,
    ) -> Result<MutationOutcome, RemoteError> {
        let data = self.execute(operation, request)?;
        let payload = graphql::pages_field(&data, operation).ok_or_else(|| {
            RemoteError::MalformedResponse {
                operation: operation.to_string(),
                message: format!("missing pages.{operation} in response"),
            }
        })?;
        let wire: WireMutationResult = decode(operation, payload.clone())?;
        let message = wire.response_result.into_outcome(operation)?;
        Ok(MutationOutcome {
            message,
            page: wire.page.map(WireMutatedPage::into_model),
        })
    }
}

impl WikiApi for GraphQlClient {
    fn fetch_page_by_id(&mut self, id: i64) -> Result<Option<Page>, RemoteError> {
        let result =
            self.query::<WirePage>("single", PAGE_BY_ID_QUERY, json!({ "id": id }), "single");
        missing_as_none(result).map(|page| page.map(WirePage::into_model))
    }

    fn fetch_page_by_path(
        &mut self,
        path: &str,
        locale: &str,
    ) -> Result<Option<Page>, RemoteError> {
        let result = self.query::<WirePage>(
            "singleByPath",
            PAGE_BY_PATH_QUERY,
            json!({ "path": path, "locale": locale }),
            "singleByPath",
        );
        missing_as_none(result).map(|page| page.map(WirePage::into_model))
    }

    fn list_pages(&mut self) -> Result<Vec<PageSummary>, RemoteError> {
        let items = self
            .query::<Vec<WireListItem>>("list", LIST_PAGES_QUERY, json!({}), "list")?
            .unwrap_or_default();
        Ok(items.into_iter().map(WireListItem::into_model).collect())
    }

    fn search_pages(&mut self, query: &str) -> Result<SearchResults, RemoteError> {
        let response = self
            .query::<WireSearchResponse>(
                "search",
                SEARCH_PAGES_QUERY,
                json!({ "query": query }),
                "search",
            )?
            .unwrap_or_default();
        Ok(SearchResults {
            results: response
                .results
                .into_iter()
                .map(WireSearchHit::into_model)
                .collect(),
            suggestions: response.suggestions,
            total_hits: response.total_hits,
        })
    }

    fn create_page(&mut self, page: &NewPage) -> Result<MutationOutcome, RemoteError> {
        let request = GraphQlRequest {
            query: CREATE_PAGE_MUTATION.to_string(),
            variables: json!({
                "content": page.content,
                "description": page.description,
                "editor": page.editor,
                "isPublished": page.is_published,
                "isPrivate": page.is_private,
                "locale": page.locale,
                "path": page.path,
                "tags": page.tags,
                "title": page.title,
            }),
        };
        self.mutate("create", &request)
    }

    fn update_page(&mut self, update: &PageUpdate) -> Result<MutationOutcome, RemoteError> {
        self.mutate("update", &graphql::build_update_request(update))
    }

    fn delete_page(&mut self, id: i64) -> Result<MutationOutcome, RemoteError> {
        let request = GraphQlRequest {
            query: DELETE_PAGE_MUTATION.to_string(),
            variables: json!({ "id": id }),
        };
        self.mutate("delete", &request)
    }

    fn move_page(
        &mut self,
        id: i64,
        destination_path: &str,
        destination_locale: &str,
    ) -> Result<MutationOutcome, RemoteError> {
        let request = GraphQlRequest {
            query: MOVE_PAGE_MUTATION.to_string(),
            variables: json!({
                "id": id,
                "destinationPath": destination_path,
                "destinationLocale": destination_locale,
            }),
        };
        self.mutate("move", &request)
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// Map a non-2xx status onto [`RemoteError::Transport`], keeping a short body excerpt.
pub fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let excerpt: String = body.trim().chars().take(200).collect();
    RemoteError::Transport {
        status: Some(status.as_u16()),
        message: excerpt,
    }
}

fn missing_as_none<T>(result: Result<Option<T>, RemoteError>) -> Result<Option<T>, RemoteError> {
    match result {
        Err(error) if error.is_missing_page() => Ok(None),
        other => other,
    }
}

fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|error| RemoteError::MalformedResponse {
        operation: operation.to_string(),
        message: error.to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    id: i64,
    path: String,
    locale: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    editor: Option<String>,
    #[serde(default)]
    is_published: bool,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    tags: Option<Vec<WireTag>>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    tag: String,
}

impl WirePage {
    fn into_model(self) -> Page {
        Page {
            id: self.id,
            path: self.path,
            locale: self.locale,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            content_type: self.content_type.unwrap_or_default(),
            editor: self.editor.unwrap_or_default(),
            is_published: self.is_published,
            is_private: self.is_private,
            tags: self
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(|tag| tag.tag)
                .collect(),
            created_at: self.created_at.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListItem {
    id: i64,
    path: String,
    locale: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    is_published: bool,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    tags: Option<Vec<Option<String>>>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl WireListItem {
    fn into_model(self) -> PageSummary {
        PageSummary {
            id: self.id,
            path: self.path,
            locale: self.locale,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            content_type: self.content_type.unwrap_or_default(),
            is_published: self.is_published,
            is_private: self.is_private,
            tags: self.tags.unwrap_or_default().into_iter().flatten().collect(),
            created_at: self.created_at.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireSearchResponse {
    #[serde(default)]
    results: Vec<WireSearchHit>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    total_hits: i64,
}

#[derive(Debug, Deserialize)]
struct WireSearchHit {
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

impl WireSearchHit {
    fn into_model(self) -> SearchHit {
        let id = match self.id {
            Value::String(id) => id,
            other => other.to_string(),
        };
        SearchHit {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            locale: self.locale.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMutationResult {
    response_result: ResponseResult,
    #[serde(default)]
    page: Option<WireMutatedPage>,
}

#[derive(Debug, Deserialize)]
struct WireMutatedPage {
    id: i64,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl WireMutatedPage {
    fn into_model(self) -> MutatedPage {
        MutatedPage {
            id: self.id,
            path: self.path.unwrap_or_default(),
            locale: self.locale.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
        }
    }
}
