pub mod daemon;
pub mod http_client;
