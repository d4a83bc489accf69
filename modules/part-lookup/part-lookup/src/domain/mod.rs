pub mod chunker;
pub mod decoder;
pub mod executor;
pub mod matching;
pub mod routes;
pub mod service;
