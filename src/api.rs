pub mod client;
pub mod notice;
