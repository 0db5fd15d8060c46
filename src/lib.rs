pub mod config;
pub mod logger;
pub mod content;
pub mod post;
pub mod post_filter;
pub mod post_assembler;
pub mod text_utils;
pub mod util;
pub mod api;
pub mod media;
pub mod exporter;
mod test_data;
mod test_server;
