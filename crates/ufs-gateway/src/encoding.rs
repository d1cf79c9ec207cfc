//! Content-encoding negotiation and streaming compression

use async_compression::tokio::bufread::{GzipEncoder, ZlibEncoder};
use axum::http::HeaderValue;
use tokio_util::io::{ReaderStream, StreamReader};
use ufs_store::ByteStream;

/// Supported response content encodings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    /// zlib-wrapped deflate, as HTTP defines it
    Deflate,
}

impl ContentEncoding {
    /// Value for the `Content-Encoding` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }
}

/// Audio and video payloads are already compressed
pub fn is_precompressed(content_type: &str) -> bool {
    match content_type.parse::<mime::Mime>() {
        Ok(parsed) => parsed.type_() == mime::AUDIO || parsed.type_() == mime::VIDEO,
        Err(_) => {
            let lower = content_type.trim_start().to_ascii_lowercase();
            lower.starts_with("audio") || lower.starts_with("video")
        }
    }
}

fn accepts(accept_encoding: &str, coding: &str) -> bool {
    accept_encoding.split(',').any(|token| {
        let mut params = token.split(';');
        let name = params.next().unwrap_or_default().trim();
        if !name.eq_ignore_ascii_case(coding) {
            return false;
        }
        // q=0 means "not acceptable"
        params
            .find_map(|param| param.trim().strip_prefix("q="))
            .map_or(true, |q| q.trim().parse::<f32>().map_or(false, |q| q > 0.0))
    })
}

/// Pick the response encoding: gzip first, then deflate, never for audio or
/// video content
pub fn negotiate(
    accept_encoding: Option<&HeaderValue>,
    content_type: &str,
) -> Option<ContentEncoding> {
    if is_precompressed(content_type) {
        return None;
    }
    let accept = accept_encoding?.to_str().ok()?;

    if accepts(accept, "gzip") {
        Some(ContentEncoding::Gzip)
    } else if accepts(accept, "deflate") {
        Some(ContentEncoding::Deflate)
    } else {
        None
    }
}

/// Pipe a byte stream through a streaming compressor
pub fn compress(stream: ByteStream, encoding: ContentEncoding) -> ByteStream {
    let reader = StreamReader::new(stream);
    match encoding {
        ContentEncoding::Gzip => Box::pin(ReaderStream::new(GzipEncoder::new(reader))),
        ContentEncoding::Deflate => Box::pin(ReaderStream::new(ZlibEncoder::new(reader))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::TryStreamExt;
    use rstest::rstest;
    use std::io::Read;
    use ufs_store::chunked_stream;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[rstest]
    #[case("gzip, deflate", Some(ContentEncoding::Gzip))]
    #[case("deflate, gzip", Some(ContentEncoding::Gzip))]
    #[case("deflate", Some(ContentEncoding::Deflate))]
    #[case("br, deflate;q=0.5", Some(ContentEncoding::Deflate))]
    #[case("GZIP", Some(ContentEncoding::Gzip))]
    #[case("gzip;q=0, deflate", Some(ContentEncoding::Deflate))]
    #[case("br", None)]
    #[case("identity", None)]
    #[case("", None)]
    fn test_negotiate(#[case] accept: &str, #[case] expected: Option<ContentEncoding>) {
        assert_eq!(negotiate(Some(&header(accept)), "text/plain"), expected);
    }

    #[test]
    fn test_no_accept_encoding() {
        assert_eq!(negotiate(None, "text/plain"), None);
    }

    #[rstest]
    #[case("audio/mpeg")]
    #[case("video/mp4")]
    #[case("video/webm; codecs=vp9")]
    #[case("audio")]
    fn test_media_never_compressed(#[case] content_type: &str) {
        assert!(is_precompressed(content_type));
        assert_eq!(negotiate(Some(&header("gzip, deflate")), content_type), None);
    }

    #[test]
    fn test_other_types_compressible() {
        assert!(!is_precompressed("image/svg+xml"));
        assert!(!is_precompressed("application/octet-stream"));
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn test_gzip_stream() {
        let data = Bytes::from("hello hello hello hello ".repeat(100));
        let compressed = collect(compress(chunked_stream(data.clone(), 7), ContentEncoding::Gzip)).await;
        assert!(compressed.len() < data.len());

        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[tokio::test]
    async fn test_deflate_stream() {
        let data = Bytes::from("abcabcabc".repeat(50));
        let compressed = collect(compress(chunked_stream(data.clone(), 16), ContentEncoding::Deflate)).await;

        let mut decoded = Vec::new();
        flate2::read::ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[tokio::test]
    async fn test_compress_propagates_errors() {
        let failing: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("disk gone")),
        ]));
        let result: Result<Vec<Bytes>, _> = compress(failing, ContentEncoding::Gzip).try_collect().await;
        assert!(result.is_err());
    }
}
