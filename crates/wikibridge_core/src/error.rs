use serde::Serialize;

/// Failure raised while talking to the wiki GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("wiki API request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("{}", transport_message(*status, message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("wiki API rejected the request: {}", details.join("; "))]
    RemoteRejected { details: Vec<String> },

    #[error("wiki API {operation} failed: {message}")]
    OperationRejected {
        operation: String,
        message: String,
        error_code: Option<i64>,
    },

    #[error("wiki API returned neither data nor errors")]
    EmptyResponse,

    #[error("unexpected wiki API response for {operation}: {message}")]
    MalformedResponse { operation: String, message: String },
}

fn transport_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) if message.is_empty() => {
            format!("wiki API request failed with HTTP {status}")
        }
        Some(status) => format!("wiki API request failed with HTTP {status}: {message}"),
        None => format!("failed to call wiki API: {message}"),
    }
}

impl RemoteError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::OperationRejected { .. } => "operation_rejected",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// True when the remote reported that the addressed page does not exist.
    pub fn is_missing_page(&self) -> bool {
        let texts: Vec<&str> = match self {
            Self::RemoteRejected { details } => details.iter().map(String::as_str).collect(),
            Self::OperationRejected { message, .. } => vec![message.as_str()],
            _ => return false,
        };
        texts.iter().any(|text| {
            let lowered = text.to_ascii_lowercase();
            lowered.contains("does not exist")
                || lowered.contains("page not found")
                || lowered.contains("pagenotfound")
        })
    }
}

/// One field-level problem found while decoding tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("page not found: {0}")]
    NotFound(String),

    #[error("invalid arguments: {}", render_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.path, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Remote(error) => error.kind(),
        }
    }

    pub fn not_found_path(path: &str, locale: &str) -> Self {
        Self::NotFound(format!("{path} ({locale})"))
    }

    pub fn not_found_id(id: i64) -> Self {
        Self::NotFound(format!("id {id}"))
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
