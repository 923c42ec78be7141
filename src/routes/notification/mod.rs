mod handler;
mod model;

pub use handler::{
    create_notification, delete_notification, get_notifications, mark_all_read, mark_read,
};
