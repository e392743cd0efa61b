use serde::Serialize;

/// A sparse update slot: either left out by the caller or set to a value.
///
/// Distinct from `Option<T>` so that "absent" never collapses into "empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Unset,
    Set(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Unset,
        }
    }
}

/// Full page as returned by a single-page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub path: String,
    pub locale: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub content_type: String,
    pub editor: String,
    pub is_published: bool,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing projection; carries tags but no body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: i64,
    pub path: String,
    pub locale: String,
    pub title: String,
    pub description: String,
    pub content_type: String,
    pub is_published: bool,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub suggestions: Vec<String>,
    pub total_hits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub path: String,
    pub locale: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub editor: String,
    pub is_published: bool,
    pub is_private: bool,
    pub tags: Vec<String>,
}

/// Merged field set submitted to the remote update mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageUpdate {
    pub id: i64,
    pub content: Field<String>,
    pub title: Field<String>,
    pub description: Field<String>,
    pub is_published: Field<bool>,
    pub tags: Field<Vec<String>>,
}

/// Page reference echoed back by create/update mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutatedPage {
    pub id: i64,
    pub path: String,
    pub locale: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationOutcome {
    pub message: Option<String>,
    pub page: Option<MutatedPage>,
}

/// Caller-supplied identity: a numeric id or a (path, locale) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocator {
    pub id: Option<i64>,
    pub path: Option<String>,
    pub locale: String,
}

/// Result of identity resolution; `page` is kept when resolution had to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub id: i64,
    pub page: Option<Page>,
}
