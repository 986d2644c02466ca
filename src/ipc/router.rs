use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

type Family = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const FAMILIES: &[Family] = &[
    handlers::core::try_handle,
    handlers::courses::try_handle,
    handlers::students::try_handle,
    handlers::rollcall::try_handle,
    handlers::ledger::try_handle,
    handlers::grades::try_handle,
    handlers::exchange::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let Some(mut resp) = FAMILIES.iter().find_map(|family| family(state, &req)) else {
        return err(
            &req.id,
            "not_implemented",
            format!("unknown method: {}", req.method),
            None,
        );
    };

    // Persist once per command, after it settled. The response still
    // reports success; a failed save only adds a note.
    if let Some(Err(e)) = state.persist_if_changed() {
        if let Some(result) = resp.get_mut("result").and_then(|r| r.as_object_mut()) {
            result.insert("persistError".to_string(), format!("{e:#}").into());
        }
    }
    resp
}
