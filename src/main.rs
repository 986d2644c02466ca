mod backup;
mod config;
mod db;
mod error;
mod gradebook;
mod grades;
mod ipc;
mod ledger;
mod model;
mod projection;
mod reclassify;
mod session;
mod sheets;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let config = config::Config::from_env();
    config::init_tracing(&config);

    let mut state = ipc::AppState::new(config.user_id.clone());
    if let Some(workspace) = &config.workspace {
        // A bad startup workspace must not keep the sidecar from answering.
        if let Err(e) = state.open_workspace(workspace, &config.user_id) {
            tracing::warn!(
                workspace = %workspace.to_string_lossy(),
                "failed to open startup workspace: {e:#}"
            );
        }
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rollbookd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::debug!("dropping malformed request: {e}");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
