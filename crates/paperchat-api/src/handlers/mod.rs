mod files;
mod generated_view;
mod health;
mod regenerate;
mod upload_complete;

pub use files::{get_file, list_files};
pub use generated_view::generated_view;
pub use health::health;
pub use regenerate::regenerate;
pub use upload_complete::upload_complete;
