// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::services::generator::Generator;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub generator: Arc<dyn Generator>,
    pub generate_timeout: Duration,
}

impl AppState {
    pub fn new(generator: Arc<dyn Generator>, generate_timeout: Duration) -> Self {
        Self {
            generator,
            generate_timeout,
        }
    }
}
