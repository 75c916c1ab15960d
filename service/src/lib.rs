use config::Config;
use fanout::dispatch::{self, DispatchReceiver};
use fanout::Manager;
use log::info;
use std::sync::Arc;

pub mod config;
pub mod logging;

/// Builds the fan-out manager and the receiving end of its dispatch queue.
/// The caller hands the receiver to a `Dispatcher` bound to a transport.
pub fn init_fanout(config: &Config) -> (Manager, DispatchReceiver) {
    let options = config.manager_options();
    info!(
        "Fan-out config: unsubscribe_matching={}, case_sensitive_actions={}",
        options.unsubscribe_matching, options.case_sensitive_actions,
    );

    let (queue, receiver) = dispatch::channel();
    (Manager::with_options(queue, options), receiver)
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub fanout_manager: Arc<Manager>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, manager: &Arc<Manager>) -> Self {
        Self {
            fanout_manager: Arc::clone(manager),
            config: app_config,
        }
    }
}
