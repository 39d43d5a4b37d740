pub mod comment;
pub mod config;
pub mod notification;
pub mod post;
pub mod ranking;
pub mod transport;
pub mod user;
