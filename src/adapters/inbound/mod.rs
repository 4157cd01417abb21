mod http_server;

pub use http_server::{router, ApiError, HttpServer, MAX_BODY_BYTES};
