mod handler;
mod model;

pub use handler::{assign_volunteer, get_suggestions, get_volunteers};
