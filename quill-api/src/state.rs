use quill_llm::checker::ContentChecker;
use quill_store::Store;

/// Shared by every request: the connection pool and the AI checker.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub checker: ContentChecker,
}

impl AppState {
    pub fn new(store: Store, checker: ContentChecker) -> Self {
        Self { store, checker }
    }
}
