use serde_json::{Value, json};
use wikibridge_core::config::ToolSettings;
use wikibridge_core::error::RemoteError;
use wikibridge_core::gateway::WikiApi;
use wikibridge_core::model::{
    Field, MutatedPage, MutationOutcome, NewPage, Page, PageSummary, PageUpdate, SearchResults,
};
use wikibridge_core::server::Server;

#[derive(Default)]
struct MemoryWiki {
    pages: Vec<Page>,
    requests: usize,
}

impl MemoryWiki {
    fn find(&self, id: i64) -> Result<usize, RemoteError> {
        self.pages
            .iter()
            .position(|page| page.id == id)
            .ok_or_else(|| RemoteError::OperationRejected {
                operation: "page".to_string(),
                message: "This page does not exist.".to_string(),
                error_code: Some(6003),
            })
    }

    fn outcome(&self, index: usize, message: &str) -> MutationOutcome {
        let page = &self.pages[index];
        MutationOutcome {
            message: Some(message.to_string()),
            page: Some(MutatedPage {
                id: page.id,
                path: page.path.clone(),
                locale: page.locale.clone(),
                title: page.title.clone(),
            }),
        }
    }
}

impl WikiApi for MemoryWiki {
    fn fetch_page_by_id(&mut self, id: i64) -> Result<Option<Page>, RemoteError> {
        self.requests += 1;
        Ok(self.pages.iter().find(|page| page.id == id).cloned())
    }

    fn fetch_page_by_path(
        &mut self,
        path: &str,
        locale: &str,
    ) -> Result<Option<Page>, RemoteError> {
        self.requests += 1;
        Ok(self
            .pages
            .iter()
            .find(|page| page.path == path && page.locale == locale)
            .cloned())
    }

    fn list_pages(&mut self) -> Result<Vec<PageSummary>, RemoteError> {
        self.requests += 1;
        Ok(self
            .pages
            .iter()
            .map(|page| PageSummary {
                id: page.id,
                path: page.path.clone(),
                locale: page.locale.clone(),
                title: page.title.clone(),
                description: page.description.clone(),
                content_type: page.content_type.clone(),
                is_published: page.is_published,
                is_private: page.is_private,
                tags: page.tags.clone(),
                created_at: page.created_at.clone(),
                updated_at: page.updated_at.clone(),
            })
            .collect())
    }

    fn search_pages(&mut self, _query: &str) -> Result<SearchResults, RemoteError> {
        self.requests += 1;
        Ok(SearchResults::default())
    }

    fn create_page(&mut self, new_page: &NewPage) -> Result<MutationOutcome, RemoteError> {
        self.requests += 1;
        let id = self.pages.iter().map(|page| page.id).max().unwrap_or(0) + 1;
        self.pages.push(Page {
            id,
            path: new_page.path.clone(),
            locale: new_page.locale.clone(),
            title: new_page.title.clone(),
            description: new_page.description.clone(),
            content: new_page.content.clone(),
            content_type: "markdown".to_string(),
            editor: new_page.editor.clone(),
            is_published: new_page.is_published,
            is_private: new_page.is_private,
            tags: new_page.tags.clone(),
            created_at: "2024-05-01T10:00:00Z".to_string(),
            updated_at: "2024-05-01T10:00:00Z".to_string(),
        });
        Ok(self.outcome(self.pages.len() - 1, "Page created."))
    }

    fn update_page(&mut self, update: &PageUpdate) -> Result<MutationOutcome, RemoteError> {
        self.requests += 1;
        let index = self.find(update.id)?;
        let page = &mut self.pages[index];
        page.content = update.content.clone().into_option().unwrap_or_default();
        page.tags = update.tags.clone().into_option().unwrap_or_default();
        if let Field::Set(title) = &update.title {
            page.title = title.clone();
        }
        if let Field::Set(published) = update.is_published {
            page.is_published = published;
        }
        Ok(self.outcome(index, "Page updated."))
    }

    fn delete_page(&mut self, id: i64) -> Result<MutationOutcome, RemoteError> {
        self.requests += 1;
        let index = self.find(id)?;
        self.pages.remove(index);
        Ok(MutationOutcome {
            message: Some("Page deleted.".to_string()),
            page: None,
        })
    }

    fn move_page(
        &mut self,
        id: i64,
        destination_path: &str,
        destination_locale: &str,
    ) -> Result<MutationOutcome, RemoteError> {
        self.requests += 1;
        let index = self.find(id)?;
        self.pages[index].path = destination_path.to_string();
        self.pages[index].locale = destination_locale.to_string();
        Ok(self.outcome(index, "Page moved."))
    }

    fn request_count(&self) -> usize {
        self.requests
    }
}

fn rpc(id: i64, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

fn tool_call(id: i64, name: &str, arguments: Value) -> String {
    rpc(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

fn run_session(lines: &[String]) -> (Vec<Value>, Server<MemoryWiki>) {
    let mut server = Server::new(MemoryWiki::default(), ToolSettings::default());
    let input = lines.join("\n");
    let mut output = Vec::new();
    server.run(input.as_bytes(), &mut output).expect("session");
    let responses = String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("response json"))
        .collect();
    (responses, server)
}

fn envelope(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    serde_json::from_str(text).expect("envelope json")
}

#[test]
fn page_lifecycle_over_stdio() {
    let lines = vec![
        rpc(1, "initialize", json!({ "protocolVersion": "2024-11-05" })),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        rpc(2, "tools/list", json!({})),
        tool_call(
            3,
            "create_page",
            json!({
                "path": "runbooks/restart",
                "title": "Restart",
                "content": "1. stop\n2. start",
                "description": "Service restart",
                "tags": ["ops"]
            }),
        ),
        tool_call(
            4,
            "update_page",
            json!({ "path": "runbooks/restart", "title": "Restart service" }),
        ),
        tool_call(5, "read_page", json!({ "id": 1 })),
        tool_call(6, "move_page", json!({ "id": 1, "destinationPath": "archive/restart" })),
        tool_call(7, "list_pages", json!({ "limit": 10 })),
        tool_call(8, "delete_page", json!({ "path": "archive/restart" })),
        tool_call(9, "delete_page", json!({ "id": 1 })),
    ];

    let (responses, server) = run_session(&lines);

    assert_eq!(responses.len(), 9);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], json!("wikibridge"));
    assert_eq!(responses[1]["result"]["tools"].as_array().map(Vec::len), Some(7));

    let created = envelope(&responses[2]);
    assert_eq!(created["success"], json!(true));

    let updated = envelope(&responses[3]);
    assert_eq!(updated["updatedFields"], json!(["title"]));

    let read = envelope(&responses[4]);
    assert_eq!(read["page"]["title"], json!("Restart service"));
    assert_eq!(read["page"]["content"], json!("1. stop\n2. start"));
    assert_eq!(read["page"]["tags"], json!(["ops"]));

    let listed = envelope(&responses[6]);
    assert_eq!(listed["pages"][0]["path"], json!("archive/restart"));
    assert_eq!(listed["has_more"], json!(false));

    assert_eq!(envelope(&responses[7])["success"], json!(true));

    let gone = &responses[8];
    assert_eq!(gone["result"]["isError"], json!(true));
    assert_eq!(envelope(gone)["kind"], json!("operation_rejected"));

    let summary = server.summary();
    assert_eq!(summary.tool_calls, 7);
    assert_eq!(summary.failed_tool_calls, 1);
    assert!(server.api().pages.is_empty());
}

#[test]
fn validation_failure_never_reaches_wiki() {
    let lines = vec![
        rpc(1, "initialize", json!({})),
        tool_call(2, "list_pages", json!({ "limit": 0, "offset": -1 })),
    ];

    let (responses, server) = run_session(&lines);

    let failure = envelope(&responses[1]);
    assert_eq!(failure["success"], json!(false));
    assert_eq!(failure["tool"], json!("list_pages"));
    assert_eq!(failure["issues"][0]["path"], json!("limit"));
    assert_eq!(failure["issues"][1]["path"], json!("offset"));
    assert_eq!(server.api().request_count(), 0);
}

#[test]
fn calls_before_initialize_are_rejected() {
    let lines = vec![tool_call(1, "read_page", json!({ "id": 1 }))];
    let (responses, _) = run_session(&lines);
    assert_eq!(responses[0]["error"]["code"], json!(-32600));
}
