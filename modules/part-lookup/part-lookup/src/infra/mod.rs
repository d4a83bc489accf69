pub mod credentials;
pub mod http_transport;
