use crate::dispatch::Dispatcher;
use crate::reactions::ReactionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub reactions: Arc<dyn ReactionStore>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, reactions: Arc<dyn ReactionStore>) -> Self {
        Self { dispatcher, reactions }
    }
}
