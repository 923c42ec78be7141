mod handler;
mod model;

pub use handler::{create_history, get_history, update_history_status};
