//! Client-side consumer for the Wayfarer chat endpoint.
//!
//! A [`ChatSession`] owns one conversation. Each send appends the user turn
//! straight away, then grows a single response turn as the body streams in.

pub mod error;
pub mod session;
pub mod transport;

pub use error::ClientError;
pub use session::ChatSession;
pub use transport::{ByteStream, ChatTransport, HttpTransport};
