//! I define the response body type and its constructors.
//!

use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full, StreamBody};
use trellis_api::service::ByteStream;

/// Body type of responses built by the protocol core.
pub type Body = UnsyncBoxBody<Bytes, std::io::Error>;

/// An empty body.
pub fn empty() -> Body {
    Empty::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body over a full buffer.
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body streaming from a borrowed byte stream. The stream is
/// released when the body is dropped, on every exit path.
pub fn from_stream(stream: ByteStream) -> Body {
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Buffer an entire byte stream. Request bodies that must be
/// parsed as a whole go through this.
pub async fn collect_stream(mut stream: ByteStream) -> std::io::Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.try_next().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}
