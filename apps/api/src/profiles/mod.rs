// Student and alumni directories: CRUD plus the verified-alumni search.

pub mod handlers;
pub mod search;
pub mod store;
