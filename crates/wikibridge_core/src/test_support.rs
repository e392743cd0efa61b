use crate::error::RemoteError;
use crate::gateway::WikiApi;
use crate::model::{
    Field, MutatedPage, MutationOutcome, NewPage, Page, PageSummary, PageUpdate, SearchResults,
};

pub fn page(id: i64, path: &str, locale: &str, content: &str) -> Page {
    Page {
        id,
        path: path.to_string(),
        locale: locale.to_string(),
        title: format!("Page {id}"),
        description: String::new(),
        content: content.to_string(),
        content_type: "markdown".to_string(),
        editor: "markdown".to_string(),
        is_published: true,
        is_private: false,
        tags: Vec::new(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn summary(page: &Page) -> PageSummary {
    PageSummary {
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
    }
}

fn mutated(page: &Page) -> MutatedPage {
    MutatedPage {
        id: page.id,
        path: page.path.clone(),
        locale: page.locale.clone(),
        title: page.title.clone(),
    }
}

/// In-memory wiki that records every call it receives.
#[derive(Default)]
pub struct MockWiki {
    pub pages: Vec<Page>,
    pub search_results: SearchResults,
    pub calls: Vec<String>,
    pub updates: Vec<PageUpdate>,
    pub fail_next: Option<RemoteError>,
    /// Ids left out of `list_pages` while still fetchable by id or path.
    pub unlisted: Vec<i64>,
    next_id: i64,
}

impl MockWiki {
    pub fn with_pages(pages: Vec<Page>) -> Self {
        let next_id = pages.iter().map(|page| page.id).max().unwrap_or(0) + 1;
        Self {
            pages,
            next_id,
            ..Self::default()
        }
    }

    fn record(&mut self, call: String) -> Result<(), RemoteError> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn rejected(operation: &str, message: &str) -> RemoteError {
        RemoteError::OperationRejected {
            operation: operation.to_string(),
            message: message.to_string(),
            error_code: None,
        }
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|call| call.starts_with(prefix)).count()
    }
}

impl WikiApi for MockWiki {
    fn fetch_page_by_id(&mut self, id: i64) -> Result<Option<Page>, RemoteError> {
        self.record(format!("fetch_page_by_id {id}"))?;
        Ok(self.pages.iter().find(|page| page.id == id).cloned())
    }

    fn fetch_page_by_path(
        &mut self,
        path: &str,
        locale: &str,
    ) -> Result<Option<Page>, RemoteError> {
        self.record(format!("fetch_page_by_path {path} {locale}"))?;
        Ok(self
            .pages
            .iter()
            .find(|page| page.path == path && page.locale == locale)
            .cloned())
    }

    fn list_pages(&mut self) -> Result<Vec<PageSummary>, RemoteError> {
        self.record("list_pages".to_string())?;
        Ok(self
            .pages
            .iter()
            .filter(|page| !self.unlisted.contains(&page.id))
            .map(summary)
            .collect())
    }

    fn search_pages(&mut self, query: &str) -> Result<SearchResults, RemoteError> {
        self.record(format!("search_pages {query}"))?;
        Ok(self.search_results.clone())
    }

    fn create_page(&mut self, new_page: &NewPage) -> Result<MutationOutcome, RemoteError> {
        self.record(format!("create_page {} {}", new_page.path, new_page.locale))?;
        if self
            .pages
            .iter()
            .any(|page| page.path == new_page.path && page.locale == new_page.locale)
        {
            return Err(Self::rejected(
                "create",
                "Cannot create this page because an entry already exists at the same path.",
            ));
        }
        self.next_id = self.next_id.max(1);
        let created = Page {
            id: self.next_id,
            path: new_page.path.clone(),
            locale: new_page.locale.clone(),
            title: new_page.title.clone(),
            description: new_page.description.clone(),
            content: new_page.content.clone(),
            content_type: new_page.editor.clone(),
            editor: new_page.editor.clone(),
            is_published: new_page.is_published,
            is_private: new_page.is_private,
            tags: new_page.tags.clone(),
            created_at: "2024-03-01T00:00:00Z".to_string(),
            updated_at: "2024-03-01T00:00:00Z".to_string(),
        };
        self.next_id += 1;
        let outcome = MutationOutcome {
            message: Some("Page created successfully.".to_string()),
            page: Some(mutated(&created)),
        };
        self.pages.push(created);
        Ok(outcome)
    }

    fn update_page(&mut self, update: &PageUpdate) -> Result<MutationOutcome, RemoteError> {
        self.record(format!("update_page {}", update.id))?;
        self.updates.push(update.clone());
        let Some(stored) = self.pages.iter_mut().find(|page| page.id == update.id) else {
            return Err(Self::rejected("update", "This page does not exist."));
        };
        // Mirror the remote quirk: absent content/tags are cleared.
        stored.content = update.content.clone().into_option().unwrap_or_default();
        stored.tags = update.tags.clone().into_option().unwrap_or_default();
        if let Field::Set(title) = &update.title {
            stored.title = title.clone();
        }
        if let Field::Set(description) = &update.description {
            stored.description = description.clone();
        }
        if let Field::Set(flag) = update.is_published {
            stored.is_published = flag;
        }
        Ok(MutationOutcome {
            message: Some("Page has been updated.".to_string()),
            page: Some(mutated(stored)),
        })
    }

    fn delete_page(&mut self, id: i64) -> Result<MutationOutcome, RemoteError> {
        self.record(format!("delete_page {id}"))?;
        let before = self.pages.len();
        self.pages.retain(|page| page.id != id);
        if self.pages.len() == before {
            return Err(Self::rejected("delete", "This page does not exist."));
        }
        Ok(MutationOutcome {
            message: Some("Page has been deleted.".to_string()),
            page: None,
        })
    }

    fn move_page(
        &mut self,
        id: i64,
        destination_path: &str,
        destination_locale: &str,
    ) -> Result<MutationOutcome, RemoteError> {
        self.record(format!(
            "move_page {id} {destination_path} {destination_locale}"
        ))?;
        let Some(stored) = self.pages.iter_mut().find(|page| page.id == id) else {
            return Err(Self::rejected("move", "This page does not exist."));
        };
        stored.path = destination_path.to_string();
        stored.locale = destination_locale.to_string();
        Ok(MutationOutcome {
            message: Some("Page has been moved.".to_string()),
            page: None,
        })
    }

    fn request_count(&self) -> usize {
        self.calls.len()
    }
}
