//! I define the [`BinaryService`] interface, the exclusive owner
//! of blob content, along with its multipart upload [`Resolver`].
//!

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use ldp_typed_headers::digest::DigestAlgorithm;
use mime::Mime;

use super::ServiceError;
use crate::identifier::TrellisIdentifier;

/// A borrowed, scoped stream of blob bytes. Dropping the stream
/// releases the underlying handle on every exit path.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Metadata attached to blob content on write.
#[derive(Debug, Clone, Default)]
pub struct BinaryMetadata {
    /// Media type of the content, if declared.
    pub mime_type: Option<Mime>,
}

/// The opaque byte store. Blobs are content addressed by internal
/// id; a replaced blob keeps its old id until storage gc, outside
/// this interface.
#[async_trait]
pub trait BinaryService: Send + Sync {
    /// Borrow a readable stream over the blob with given id, if
    /// present.
    async fn get_content(
        &self,
        partition: &str,
        internal_id: &str,
    ) -> Result<Option<ByteStream>, ServiceError>;

    /// Write blob content under given id.
    async fn set_content(
        &self,
        partition: &str,
        internal_id: &str,
        stream: ByteStream,
        metadata: BinaryMetadata,
    ) -> Result<(), ServiceError>;

    /// Compute the digest of the blob behind given stream with the
    /// given algorithm, base64 encoded.
    async fn digest(
        &self,
        algorithm: DigestAlgorithm,
        stream: ByteStream,
    ) -> Result<String, ServiceError>;

    /// Digest algorithms this store supports.
    fn supported_algorithms(&self) -> &[DigestAlgorithm];

    /// The multipart upload resolver serving given partition, if
    /// any.
    fn resolver_for(&self, partition: &str) -> Option<&dyn Resolver>;

    /// Mint a fresh internal blob id for given partition.
    fn generate_identifier(&self, partition: &str) -> String;
}

/// Details of a finalized multipart upload, from which the
/// controller persists the resource.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// Identifier of the resource the upload targets.
    pub target: TrellisIdentifier,

    /// Internal id of the assembled blob.
    pub internal_id: String,

    /// Media type of the assembled blob.
    pub mime_type: Mime,

    /// Size of the assembled blob, in bytes.
    pub size: u64,
}

/// Multipart upload lifecycle of a binary store backend.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// If this backend supports multipart uploads at all.
    fn supports_multipart_upload(&self) -> bool;

    /// Open an upload session targeting given resource. Returns
    /// the session id.
    async fn initiate_upload(
        &self,
        target: &TrellisIdentifier,
        mime_type: Mime,
    ) -> Result<String, ServiceError>;

    /// Stream one part into the session. Returns the part digest.
    async fn upload_part(
        &self,
        session: &str,
        part_number: u32,
        stream: ByteStream,
    ) -> Result<String, ServiceError>;

    /// List parts uploaded so far, with their digests.
    async fn list_parts(&self, session: &str) -> Result<Vec<(u32, String)>, ServiceError>;

    /// If given session is open.
    async fn upload_session_exists(&self, session: &str) -> Result<bool, ServiceError>;

    /// Assemble the parts and close the session.
    async fn complete_upload(
        &self,
        session: &str,
        parts: BTreeMap<u32, String>,
    ) -> Result<CompletedUpload, ServiceError>;

    /// Discard the session and any uploaded parts.
    async fn abort_upload(&self, session: &str) -> Result<(), ServiceError>;
}
