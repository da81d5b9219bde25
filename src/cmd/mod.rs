/*!
Subcommand modules.

  src/cmd/
    serve.rs   (ServeArgs + execute_serve)  MCP server over stdio
    list.rs    (ToolsArgs + execute_tools)  print the operation catalog
    exec.rs    (ExecArgs  + execute_exec)   run one operation in-process
    shared.rs  runtime, dispatcher wiring, parameter collection
    style.rs   human output helpers

Each subcommand exposes one `execute_*` entry point; argument structs
derive `clap::Args`.
*/

pub mod exec;
pub mod list;
pub mod serve;
pub mod shared;
pub mod style;

pub use exec::{ExecArgs, execute_exec};
pub use list::{ToolsArgs, execute_tools};
pub use serve::{ServeArgs, execute_serve};
