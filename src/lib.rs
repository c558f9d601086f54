// Library surface for the typing engine; the binary only adds the terminal front end.
pub mod analytics;
pub mod app_dirs;
pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod keys;
pub mod recorder;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod util;
pub mod word_source;
