/*!
`serve.rs`

Implements the `serve` subcommand (the default): probe the bridge, then
run the MCP server over stdio until the client disconnects.
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{build_dispatcher, runtime};
use crate::config::Config;
use crate::mcp::AdbMcpServer;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

pub fn execute_serve(_args: ServeArgs, config: &Config) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let dispatcher = build_dispatcher(config).await?;
        AdbMcpServer::new(dispatcher).serve_stdio().await
    })
}
