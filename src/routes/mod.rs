pub mod auth;
pub mod event;
pub mod history;
pub mod matching;
pub mod notification;
pub mod profile;
