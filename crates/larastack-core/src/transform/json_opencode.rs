//! `json.opencode.syncMcp`: keep only the MCP servers that match the selected modules

use super::TransformContext;
use crate::error::{Result, RuleError};
use crate::modules::Module;
use serde_json::{json, Map, Value};

fn local_server(command: &[&str]) -> Value {
    json!({
        "type": "local",
        "command": command,
        "enabled": true,
    })
}

fn mcp_servers(ctx: &TransformContext<'_>) -> Map<String, Value> {
    let mut servers = Map::new();
    servers.insert("ark-ui".to_string(), local_server(&["npx", "-y", "@ark-ui/mcp"]));

    if ctx.modules.contains(Module::Backend) {
        servers.insert(
            "laravel-boost".to_string(),
            local_server(&[
                "docker",
                "exec",
                "-i",
                "larastack-app-1",
                "php",
                "/var/www/html/artisan",
                "boost:mcp",
            ]),
        );
    }
    if ctx.modules.contains(Module::Frontend) {
        servers.insert(
            "panda".to_string(),
            local_server(&["pnpm", "--filter", "frontend", "exec", "panda", "mcp"]),
        );
    }
    servers
}

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let json_error = |source: serde_json::Error| RuleError::Json {
        path: ctx.file.to_path_buf(),
        source,
    };

    let parsed = serde_json::from_str::<Value>(source).map_err(|e| ctx.parse_error(e))?;
    let mut config = match parsed {
        Value::Object(map) => map,
        _ => return Err(ctx.not_found("top-level object")),
    };
    config.insert("mcp".to_string(), Value::Object(mcp_servers(ctx)));

    let mut output = serde_json::to_string_pretty(&config).map_err(json_error)?;
    output.push('\n');
    Ok(output)
}
