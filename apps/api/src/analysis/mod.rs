// Skill analysis records: owner-scoped create, history, fetch and delete.
// The verified caller comes from the auth extractor; the store is injected.

pub mod handlers;
pub mod service;
pub mod store;
pub mod validation;
