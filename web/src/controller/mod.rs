pub(crate) mod fallback_controller;
pub(crate) mod health_check_controller;
