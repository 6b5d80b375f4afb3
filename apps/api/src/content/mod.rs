// Content items and the collaborators that turn their sources into text:
// page fetching (with a run-scoped cache) and release-document extraction.

pub mod cache;
pub mod documents;
pub mod fetch;
pub mod handlers;
pub mod models;
pub mod text;
