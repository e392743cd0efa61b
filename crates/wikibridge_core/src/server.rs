//! MCP server over stdio.
//!
//! Reads newline-delimited JSON-RPC 2.0 requests, dispatches tool calls
//! against a [`WikiApi`], and writes one response line per request.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::catalog::tool_catalog;
use crate::config::ToolSettings;
use crate::gateway::WikiApi;
use crate::tools::dispatch;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "wikibridge";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerSummary {
    pub requests: usize,
    pub tool_calls: usize,
    pub failed_tool_calls: usize,
    pub remote_requests: usize,
}

pub struct Server<A: WikiApi> {
    api: A,
    settings: ToolSettings,
    shutdown: Arc<AtomicBool>,
    initialized: bool,
    summary: ServerSummary,
}

fn jsonrpc_ok(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn jsonrpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

impl<A: WikiApi> Server<A> {
    pub fn new(api: A, settings: ToolSettings) -> Self {
        Self {
            api,
            settings,
            shutdown: Arc::new(AtomicBool::new(false)),
            initialized: false,
            summary: ServerSummary::default(),
        }
    }

    /// Flag checked before each request; setting it stops the loop.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn summary(&self) -> ServerSummary {
        ServerSummary {
            remote_requests: self.api.request_count(),
            ..self.summary
        }
    }

    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<ServerSummary> {
        tracing::info!("stdio server ready");
        let mut line = String::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .context("failed to read request line")?;
            if bytes_read == 0 {
                tracing::debug!("stdin closed");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(trimmed) {
                writeln!(writer, "{response}").context("failed to write response")?;
                writer.flush().context("failed to flush response")?;
            }
        }

        let summary = self.summary();
        tracing::info!(
            requests = summary.requests,
            tool_calls = summary.tool_calls,
            failed_tool_calls = summary.failed_tool_calls,
            remote_requests = summary.remote_requests,
            "stdio server stopped"
        );
        Ok(summary)
    }

    /// Handle one request line. Notifications produce no response.
    pub fn handle_line(&mut self, line: &str) -> Option<Value> {
        self.summary.requests += 1;

        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!("unparsable request: {error}");
                return Some(jsonrpc_error(
                    &Value::Null,
                    PARSE_ERROR,
                    &format!("parse error: {error}"),
                ));
            }
        };

        let id = request.get("id").cloned();
        let method = request
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
        let reply_id = id.clone().unwrap_or(Value::Null);

        let response = match method {
            "initialize" => {
                self.initialized = true;
                jsonrpc_ok(
                    &reply_id,
                    json!({
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": {
                            "tools": { "listChanged": false }
                        },
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION"),
                        }
                    }),
                )
            }
            "notifications/initialized" | "notifications/cancelled" => return None,
            "tools/list" => {
                if !self.initialized {
                    jsonrpc_error(&reply_id, INVALID_REQUEST, "not initialized")
                } else {
                    jsonrpc_ok(&reply_id, json!({ "tools": tool_catalog() }))
                }
            }
            "tools/call" => {
                if !self.initialized {
                    jsonrpc_error(&reply_id, INVALID_REQUEST, "not initialized")
                } else {
                    jsonrpc_ok(&reply_id, self.call_tool(&params))
                }
            }
            "ping" => jsonrpc_ok(&reply_id, json!({})),
            "shutdown" | "exit" => {
                tracing::info!(method, "shutdown requested");
                self.shutdown.store(true, Ordering::SeqCst);
                if id.is_none() {
                    return None;
                }
                jsonrpc_ok(&reply_id, json!({}))
            }
            _ if id.is_none() => return None,
            _ => jsonrpc_error(
                &reply_id,
                METHOD_NOT_FOUND,
                &format!("unknown method: {method}"),
            ),
        };
        Some(response)
    }

    fn call_tool(&mut self, params: &Value) -> Value {
        let tool = params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        self.summary.tool_calls += 1;
        let envelope = dispatch(&mut self.api, &self.settings, tool, &arguments);
        if !envelope.is_success() {
            self.summary.failed_tool_calls += 1;
        }

        json!({
            "content": [{ "type": "text", "text": envelope.render() }],
            "isError": !envelope.is_success(),
        })
    }
}
