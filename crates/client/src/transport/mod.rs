//! Transport layer for the gorev client.

pub mod http;
pub mod websocket;

pub use http::HttpTransport;
pub use websocket::EventSubscriber;
