//! MCP server surface (stdio).
//!
//! tools/list -> fixed catalog, tools/call -> ToolDispatcher.
//! Failed operations come back as `isError` text results, never as
//! protocol errors.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    model::*,
    service::{RequestContext, RoleServer},
    transport::stdio,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::tools::{Operation, TextResult, ToolDispatcher};

const INSTRUCTIONS: &str = "Android device control over adb. Use list_devices first; \
every device-addressed tool accepts an optional `device` id and fails when several \
devices are connected and none is named. Relative local paths resolve under the home directory.";

/// Protocol descriptors for the whole catalog.
pub fn catalog_tools() -> Vec<Tool> {
    Operation::ALL
        .iter()
        .map(|op| Tool::new(op.name(), op.description(), Arc::new(op.input_schema())))
        .collect()
}

pub fn to_call_result(result: TextResult) -> CallToolResult {
    let content = vec![Content::text(result.text)];
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[derive(Clone)]
pub struct AdbMcpServer {
    dispatcher: ToolDispatcher,
}

impl AdbMcpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve on stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!("serving MCP over stdio");
        let service = self
            .serve(stdio())
            .await
            .context("Failed to start MCP stdio transport")?;
        service.waiting().await.context("MCP service terminated abnormally")?;
        info!("client disconnected");
        Ok(())
    }
}

impl ServerHandler for AdbMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: catalog_tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        debug!(tool = %request.name, "tools/call");
        let arguments = request.arguments.map(Value::Object);
        let result = self.dispatcher.dispatch(&request.name, arguments).await;
        Ok(to_call_result(result))
    }
}
