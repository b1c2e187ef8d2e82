//! I define byte stream adapters for range handling.
//!

use async_stream::try_stream;
use bytes::Bytes;
use futures::StreamExt;
use trellis_api::service::ByteStream;

/// Slice a byte stream to `[first, first + len)`. The skipped
/// prefix is consumed eagerly, so a skip failure surfaces here
/// rather than mid response; the bounded tail is streamed lazily.
pub async fn sliced(mut stream: ByteStream, first: u64, len: u64) -> std::io::Result<ByteStream> {
    let mut to_skip = first;
    let mut head: Option<Bytes> = None;

    while to_skip > 0 {
        match stream.next().await {
            None => break,
            Some(chunk) => {
                let chunk = chunk?;
                let chunk_len = chunk.len() as u64;
                if chunk_len <= to_skip {
                    to_skip -= chunk_len;
                } else {
                    head = Some(chunk.slice(to_skip as usize..));
                    to_skip = 0;
                }
            }
        }
    }

    let bounded = try_stream! {
        let mut remaining = len;
        if let Some(chunk) = head {
            let chunk = truncated(chunk, remaining);
            remaining -= chunk.len() as u64;
            yield chunk;
        }
        while remaining > 0 {
            match stream.next().await {
                None => break,
                Some(chunk) => {
                    let chunk = truncated(chunk?, remaining);
                    remaining -= chunk.len() as u64;
                    yield chunk;
                }
            }
        }
    };

    Ok(bounded.boxed())
}

fn truncated(chunk: Bytes, limit: u64) -> Bytes {
    if chunk.len() as u64 > limit {
        chunk.slice(..limit as usize)
    } else {
        chunk
    }
}

#[cfg(test)]
mod tests {
    use claims::assert_ok;
    use futures::TryStreamExt;

    use super::*;

    fn byte_stream(chunks: &[&'static [u8]]) -> ByteStream {
        futures::stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<std::io::Result<Bytes>>>(),
        )
        .boxed()
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.iter().flat_map(|c| c.iter().copied()).collect()
    }

    #[tokio::test]
    async fn slicing_spans_chunk_boundaries() {
        let stream = byte_stream(&[b"Some", b" ", b"data"]);
        let sliced_stream = assert_ok!(sliced(stream, 2, 5).await);
        assert_eq!(collect(sliced_stream).await, b"me da");
    }

    #[tokio::test]
    async fn slice_beyond_end_is_empty() {
        let stream = byte_stream(&[b"Some data"]);
        let sliced_stream = assert_ok!(sliced(stream, 20, 5).await);
        assert_eq!(collect(sliced_stream).await, b"");
    }

    #[tokio::test]
    async fn slice_len_is_capped_by_content() {
        let stream = byte_stream(&[b"Some data"]);
        let sliced_stream = assert_ok!(sliced(stream, 5, 100).await);
        assert_eq!(collect(sliced_stream).await, b"data");
    }

    #[tokio::test]
    async fn skip_errors_surface_eagerly() {
        let failing: ByteStream = futures::stream::iter(vec![Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "backend gone",
        ))])
        .boxed();
        assert!(sliced(failing, 2, 5).await.is_err());
    }
}
