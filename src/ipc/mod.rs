mod error;
mod handlers;
mod helpers;
mod router;
mod types;
mod views;

pub use router::handle_request;
pub use types::{AppState, Request};
