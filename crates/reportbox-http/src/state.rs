use std::sync::Arc;

use reportbox_artifact::Store;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
}

impl AppState {
  pub fn new(store: impl Store + 'static) -> Self {
    Self {
      store: Arc::new(store),
    }
  }
}
