//! I provide in memory collaborator implementations for tests:
//! a resource store with version history, a blob store with
//! multipart support, a turtle backed io service, and permissive
//! access collaborators.
//!

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use ldp_typed_headers::digest::DigestAlgorithm;
use md5::Md5;
use mime::Mime;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use sophia_api::term::{SimpleTerm, Term as _};
use trellis_vocab::{ns, oa, term, trellis};

use crate::{
    identifier::TrellisIdentifier,
    model::{
        in_graph, Binary, Dataset, GraphName, InteractionModel, Quad, QuadStreamer, Resource,
        Session, Term, Triple, VersionRange,
    },
    service::{
        AccessControlService, AccessMode, AgentService, BinaryMetadata, BinaryService,
        ByteStream, CompletedUpload, ConstraintService, IOService, JsonLdProfile, RdfSyntax,
        Resolver, ResourceService, ServiceError, Violation,
    },
};

/// A quad streamer over an in memory dataset.
pub struct MemQuads(pub Dataset);

impl QuadStreamer for MemQuads {
    fn stream(&self, graphs: &[GraphName]) -> Box<dyn Iterator<Item = Quad> + Send> {
        let graph_iris: Vec<&'static str> = graphs.iter().map(|g| g.iri()).collect();
        let selected: Vec<Quad> = self
            .0
            .iter()
            .filter(|(_, g)| {
                g.as_ref()
                    .map(|g| graph_iris.iter().any(|iri| term::is_iri(g, iri)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Box::new(selected.into_iter())
    }
}

/// Rebuild a snapshot with its quads amended in place.
fn with_amended_quads(resource: &Resource, amend: impl FnOnce(&mut Dataset)) -> Resource {
    let mut quads: Dataset = resource.stream(GraphName::ALL).collect();
    amend(&mut quads);
    let mut amended = resource.clone();
    amended.quads = Arc::new(MemQuads(quads));
    amended
}

fn containment_quad(parent: &TrellisIdentifier, child: &TrellisIdentifier) -> Quad {
    in_graph(
        [
            term::iri(parent.internal_iri()),
            term::iri(ns::ldp::contains.to_string()),
            term::iri(child.internal_iri()),
        ],
        GraphName::Containment,
    )
}

/// Build a resource snapshot over an in memory dataset, deriving
/// the same attributes [`MemResourceService`] derives on `put`.
pub fn snapshot(
    identifier: TrellisIdentifier,
    interaction_model: InteractionModel,
    modified: DateTime<Utc>,
    dataset: Dataset,
) -> Resource {
    Resource {
        identifier,
        interaction_model,
        modified,
        binary: None,
        is_memento: false,
        mementos: vec![],
        inbox: None,
        annotation_service: None,
        types: vec![],
        has_acl: false,
        quads: Arc::new(MemQuads(dataset)),
    }
}

/// The shared blob storage of a [`MemBinaryService`].
pub type BlobMap = Arc<Mutex<HashMap<String, (Option<Mime>, Vec<u8>)>>>;

/// The in memory resource store.
#[derive(Default)]
pub struct MemResourceService {
    state: Mutex<HashMap<TrellisIdentifier, StoredResource>>,
    blobs: Option<BlobMap>,
    counter: AtomicU64,
}

struct StoredResource {
    head: Resource,
    versions: Vec<(VersionRange, Resource)>,
}

impl MemResourceService {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store able to resolve blob sizes from
    /// given blob map.
    pub fn with_blobs(blobs: BlobMap) -> Self {
        Self {
            blobs: Some(blobs),
            ..Self::default()
        }
    }

    /// Seed a head snapshot directly.
    pub fn insert(&self, resource: Resource) {
        self.state.lock().unwrap().insert(
            resource.identifier.clone(),
            StoredResource {
                head: resource,
                versions: vec![],
            },
        );
    }

    /// Seed a memento snapshot covering given range.
    pub fn insert_memento(&self, range: VersionRange, mut memento: Resource) {
        memento.is_memento = true;
        let mut state = self.state.lock().unwrap();
        let stored = state
            .get_mut(&memento.identifier)
            .expect("Head snapshot must be seeded before mementos.");
        stored.versions.push((range, memento));
        stored.versions.sort_by_key(|(r, _)| r.from);
        let ranges: Vec<VersionRange> = stored.versions.iter().map(|(r, _)| *r).collect();
        stored.head.mementos = ranges.clone();
        for (_, memento) in stored.versions.iter_mut() {
            memento.mementos = ranges.clone();
        }
    }

    /// Derive a head snapshot from a persisted dataset.
    fn derive(&self, identifier: &TrellisIdentifier, dataset: Dataset) -> Resource {
        let subject_iri = identifier.internal_iri();
        let mut interaction_model = InteractionModel::RdfSource;
        let mut types: Vec<String> = vec![];
        let mut internal_id: Option<String> = None;
        let mut inbox = None;
        let mut annotation_service = None;
        let mut has_acl = false;

        for ((s, p, o), g) in &dataset {
            let graph = g
                .as_ref()
                .and_then(|g| g.iri())
                .and_then(|iri| GraphName::from_iri(iri.as_str()));
            if graph == Some(GraphName::AccessControl) {
                has_acl = true;
            }

            if !term::is_iri(s, &subject_iri) {
                continue;
            }

            if term::is_iri(p, &ns::rdf::type_.to_string()) {
                if let Some(object_iri) = o.iri() {
                    match InteractionModel::from_iri(object_iri.as_str()) {
                        Some(model) if graph == Some(GraphName::ServerManaged) => {
                            interaction_model = model;
                        }
                        Some(_) => {}
                        None => types.push(object_iri.as_str().to_owned()),
                    }
                }
            } else if term::is_iri(p, &ns::dcterms::hasPart.to_string()) {
                internal_id = o.iri().map(|iri| iri.as_str().to_owned());
            } else if term::is_iri(p, &ns::ldp::inbox.to_string()) {
                inbox = o.iri().map(|iri| iri.as_str().to_owned());
            } else if term::is_iri(p, oa::annotationService) {
                annotation_service = o.iri().map(|iri| iri.as_str().to_owned());
            }
        }

        let binary = internal_id.map(|internal_id| {
            let format = dataset
                .iter()
                .find(|([s, p, _], _)| {
                    term::is_iri(s, &internal_id)
                        && term::is_iri(p, &ns::dcterms::format.to_string())
                })
                .and_then(|([_, _, o], _)| o.lexical_form())
                .and_then(|f| f.as_ref().parse::<Mime>().ok())
                .unwrap_or(mime::APPLICATION_OCTET_STREAM);
            let size = self
                .blobs
                .as_ref()
                .and_then(|blobs| {
                    blobs
                        .lock()
                        .unwrap()
                        .get(&internal_id)
                        .map(|(_, data)| data.len() as u64)
                })
                .unwrap_or(0);
            Binary {
                internal_id,
                modified: Utc::now(),
                mime_type: format,
                size,
            }
        });

        let mut resource = snapshot(
            identifier.clone(),
            interaction_model,
            Utc::now(),
            dataset,
        );
        resource.binary = binary;
        resource.types = types;
        resource.inbox = inbox;
        resource.annotation_service = annotation_service;
        resource.has_acl = has_acl;
        resource
    }
}

#[async_trait]
impl ResourceService for MemResourceService {
    async fn get(&self, identifier: &TrellisIdentifier) -> Result<Option<Resource>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .get(identifier)
            .map(|stored| stored.head.clone()))
    }

    async fn get_at(
        &self,
        identifier: &TrellisIdentifier,
        instant: DateTime<Utc>,
    ) -> Result<Option<Resource>, ServiceError> {
        Ok(self.state.lock().unwrap().get(identifier).and_then(|stored| {
            stored
                .versions
                .iter()
                .find(|(range, _)| range.covers(instant))
                .map(|(_, memento)| memento.clone())
        }))
    }

    async fn put(
        &self,
        identifier: &TrellisIdentifier,
        dataset: Dataset,
    ) -> Result<(), ServiceError> {
        let new_head = self.derive(identifier, dataset);
        let mut state = self.state.lock().unwrap();
        let created = !state.contains_key(identifier);
        let tombstoned = new_head.is_gone();
        match state.get_mut(identifier) {
            Some(stored) => {
                let mut superseded = stored.head.clone();
                superseded.is_memento = true;
                let range = VersionRange {
                    from: superseded.modified,
                    until: new_head.modified,
                };
                stored.versions.push((range, superseded));
                stored.head = new_head;
                stored.head.mementos =
                    stored.versions.iter().map(|(r, _)| *r).collect();
            }
            None => {
                state.insert(
                    identifier.clone(),
                    StoredResource {
                        head: new_head,
                        versions: vec![],
                    },
                );
            }
        }

        // Maintain the parent's containment graph alongside the
        // child's lifecycle.
        if let Some(parent_id) = identifier.parent().filter(|_| created || tombstoned) {
            if let Some(parent) = state.get_mut(&parent_id) {
                if created && parent.head.interaction_model.is_container() {
                    parent.head = with_amended_quads(&parent.head, |quads| {
                        quads.push(containment_quad(&parent_id, identifier));
                    });
                }
                if tombstoned {
                    let child_iri = identifier.internal_iri();
                    let containment_iri = GraphName::Containment.iri();
                    parent.head = with_amended_quads(&parent.head, |quads| {
                        quads.retain(|([_, _, o], g)| {
                            !(term::is_iri(o, &child_iri)
                                && g.as_ref()
                                    .map(|g| term::is_iri(g, containment_iri))
                                    .unwrap_or(false))
                        });
                    });
                }
            }
        }
        Ok(())
    }

    fn generate_identifier(&self) -> String {
        format!("gen-{}", self.counter.fetch_add(1, Ordering::Relaxed))
    }

    fn skolemize(&self, term: Term) -> Term {
        match term {
            SimpleTerm::BlankNode(id) => {
                term::iri(format!("trellis:bnode/{}", id.as_str()))
            }
            other => other,
        }
    }

    fn unskolemize(&self, t: Term) -> Term {
        match t.iri().and_then(|iri| {
            iri.as_str()
                .strip_prefix("trellis:bnode/")
                .map(ToOwned::to_owned)
        }) {
            Some(id) => term::bnode(id),
            None => t,
        }
    }

    fn to_internal(&self, t: Term, base_url: &str) -> Term {
        match t
            .iri()
            .and_then(|iri| iri.as_str().strip_prefix(base_url).map(ToOwned::to_owned))
        {
            Some(rest) => term::iri(format!("trellis:{}", rest)),
            None => t,
        }
    }

    fn to_external(&self, t: Term, base_url: &str) -> Term {
        match t.iri().and_then(|iri| {
            iri.as_str()
                .strip_prefix("trellis:")
                .filter(|rest| !rest.starts_with("bnode/"))
                .map(ToOwned::to_owned)
        }) {
            Some(rest) => term::iri(format!("{}{}", base_url, rest)),
            None => t,
        }
    }
}

fn one_chunk(data: Vec<u8>) -> ByteStream {
    futures::stream::iter(vec![Ok(Bytes::from(data))]).boxed()
}

async fn collect(mut stream: ByteStream) -> Result<Vec<u8>, ServiceError> {
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        data.extend_from_slice(&chunk?);
    }
    Ok(data)
}

fn compute_digest(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Md5 => BASE64.encode(Md5::digest(data)),
        DigestAlgorithm::Sha => BASE64.encode(Sha1::digest(data)),
        DigestAlgorithm::Sha256 => BASE64.encode(Sha256::digest(data)),
    }
}

/// The in memory blob store.
pub struct MemBinaryService {
    blobs: BlobMap,
    resolver: Option<MemResolver>,
    counter: AtomicU64,
}

impl MemBinaryService {
    /// Create a store without multipart support.
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(Mutex::new(HashMap::new())),
            resolver: None,
            counter: AtomicU64::new(0),
        }
    }

    /// Create a store with multipart support.
    pub fn with_multipart() -> Self {
        let blobs: BlobMap = Arc::new(Mutex::new(HashMap::new()));
        Self {
            resolver: Some(MemResolver::new(blobs.clone())),
            blobs,
            counter: AtomicU64::new(0),
        }
    }

    /// The shared blob map, linkable into a
    /// [`MemResourceService`].
    pub fn blobs(&self) -> BlobMap {
        self.blobs.clone()
    }

    /// Seed a blob directly.
    pub fn insert(&self, internal_id: impl Into<String>, mime_type: Mime, data: &[u8]) {
        self.blobs
            .lock()
            .unwrap()
            .insert(internal_id.into(), (Some(mime_type), data.to_vec()));
    }
}

impl Default for MemBinaryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinaryService for MemBinaryService {
    async fn get_content(
        &self,
        _partition: &str,
        internal_id: &str,
    ) -> Result<Option<ByteStream>, ServiceError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .get(internal_id)
            .map(|(_, data)| one_chunk(data.clone())))
    }

    async fn set_content(
        &self,
        _partition: &str,
        internal_id: &str,
        stream: ByteStream,
        metadata: BinaryMetadata,
    ) -> Result<(), ServiceError> {
        let data = collect(stream).await?;
        self.blobs
            .lock()
            .unwrap()
            .insert(internal_id.to_owned(), (metadata.mime_type, data));
        Ok(())
    }

    async fn digest(
        &self,
        algorithm: DigestAlgorithm,
        stream: ByteStream,
    ) -> Result<String, ServiceError> {
        let data = collect(stream).await?;
        Ok(compute_digest(algorithm, &data))
    }

    fn supported_algorithms(&self) -> &[DigestAlgorithm] {
        DigestAlgorithm::ALL
    }

    fn resolver_for(&self, _partition: &str) -> Option<&dyn Resolver> {
        self.resolver.as_ref().map(|r| r as &dyn Resolver)
    }

    fn generate_identifier(&self, partition: &str) -> String {
        format!(
            "mem:{}/{}",
            partition,
            self.counter.fetch_add(1, Ordering::Relaxed)
        )
    }
}

struct UploadSession {
    target: TrellisIdentifier,
    mime_type: Mime,
    parts: BTreeMap<u32, Vec<u8>>,
}

/// The in memory multipart upload resolver.
pub struct MemResolver {
    blobs: BlobMap,
    sessions: Mutex<HashMap<String, UploadSession>>,
    counter: AtomicU64,
}

impl MemResolver {
    fn new(blobs: BlobMap) -> Self {
        Self {
            blobs,
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Resolver for MemResolver {
    fn supports_multipart_upload(&self) -> bool {
        true
    }

    async fn initiate_upload(
        &self,
        target: &TrellisIdentifier,
        mime_type: Mime,
    ) -> Result<String, ServiceError> {
        let session = format!("upload-{}", self.counter.fetch_add(1, Ordering::Relaxed));
        self.sessions.lock().unwrap().insert(
            session.clone(),
            UploadSession {
                target: target.clone(),
                mime_type,
                parts: BTreeMap::new(),
            },
        );
        Ok(session)
    }

    async fn upload_part(
        &self,
        session: &str,
        part_number: u32,
        stream: ByteStream,
    ) -> Result<String, ServiceError> {
        let data = collect(stream).await?;
        let digest = compute_digest(DigestAlgorithm::Md5, &data);
        self.sessions
            .lock()
            .unwrap()
            .get_mut(session)
            .ok_or_else(|| ServiceError::new("no such upload session"))?
            .parts
            .insert(part_number, data);
        Ok(digest)
    }

    async fn list_parts(&self, session: &str) -> Result<Vec<(u32, String)>, ServiceError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session)
            .ok_or_else(|| ServiceError::new("no such upload session"))?
            .parts
            .iter()
            .map(|(n, data)| (*n, compute_digest(DigestAlgorithm::Md5, data)))
            .collect())
    }

    async fn upload_session_exists(&self, session: &str) -> Result<bool, ServiceError> {
        Ok(self.sessions.lock().unwrap().contains_key(session))
    }

    async fn complete_upload(
        &self,
        session: &str,
        _parts: BTreeMap<u32, String>,
    ) -> Result<CompletedUpload, ServiceError> {
        let upload = self
            .sessions
            .lock()
            .unwrap()
            .remove(session)
            .ok_or_else(|| ServiceError::new("no such upload session"))?;

        let data: Vec<u8> = upload.parts.into_values().flatten().collect();
        let size = data.len() as u64;
        let internal_id = format!("mem:{}/upload/{}", upload.target.partition(), session);
        self.blobs
            .lock()
            .unwrap()
            .insert(internal_id.clone(), (Some(upload.mime_type.clone()), data));

        Ok(CompletedUpload {
            target: upload.target,
            internal_id,
            mime_type: upload.mime_type,
            size,
        })
    }

    async fn abort_upload(&self, session: &str) -> Result<(), ServiceError> {
        self.sessions
            .lock()
            .unwrap()
            .remove(session)
            .map(|_| ())
            .ok_or_else(|| ServiceError::new("no such upload session"))
    }
}

/// An io service backed by the sophia turtle parsers and
/// serializers. Json-ld and html are not rendered here; tests
/// negotiate turtle or n-triples.
#[derive(Default)]
pub struct TurtleIOService;

const TEST_PREFIXES: &str = concat!(
    "@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n",
    "@prefix dc: <http://purl.org/dc/terms/> .\n",
    "@prefix ldp: <http://www.w3.org/ns/ldp#> .\n",
);

fn parse_turtle(source: &str, base_url: &str) -> Result<Vec<Triple>, ServiceError> {
    use sophia_api::{parser::TripleParser, source::TripleSource};

    let parser = sophia_turtle::parser::turtle::TurtleParser {
        base: Some(
            sophia_iri::Iri::new(base_url.to_owned())
                .map_err(|e| ServiceError::new(format!("invalid base url: {}", e)))?,
        ),
    };

    let triples: HashSet<[SimpleTerm<'static>; 3]> = parser
        .parse_str(source)
        .collect_triples()
        .map_err(|e| ServiceError::new(format!("turtle parse error: {}", e)))?;

    Ok(triples.into_iter().collect())
}

fn serialize_triples(triples: Vec<Triple>, syntax: RdfSyntax) -> Result<String, ServiceError> {
    use sophia_api::serializer::{Stringifier, TripleSerializer};

    let graph: HashSet<[SimpleTerm<'static>; 3]> = triples.into_iter().collect();
    match syntax {
        RdfSyntax::Turtle => {
            let mut serializer =
                sophia_turtle::serializer::turtle::TurtleSerializer::new_stringifier();
            serializer
                .serialize_graph(&graph)
                .map_err(|e| ServiceError::new(format!("turtle serialize error: {}", e)))?;
            Ok(serializer.to_string())
        }
        RdfSyntax::NTriples => {
            let mut serializer = sophia_turtle::serializer::nt::NtSerializer::new_stringifier();
            serializer
                .serialize_graph(&graph)
                .map_err(|e| ServiceError::new(format!("n-triples serialize error: {}", e)))?;
            Ok(serializer.to_string())
        }
        _ => Err(ServiceError::new("syntax not supported by the test io service")),
    }
}

#[async_trait]
impl IOService for TurtleIOService {
    async fn read(
        &self,
        stream: ByteStream,
        base_url: &str,
        syntax: RdfSyntax,
    ) -> Result<Vec<Triple>, ServiceError> {
        if !syntax.is_readable() {
            return Err(ServiceError::new("syntax is not readable"));
        }
        let data = collect(stream).await?;
        let source = std::str::from_utf8(&data)
            .map_err(|_| ServiceError::new("body is not valid utf-8"))?;
        parse_turtle(source, base_url)
    }

    async fn write(
        &self,
        quads: Box<dyn Iterator<Item = Quad> + Send>,
        syntax: RdfSyntax,
        _profile: Option<JsonLdProfile>,
    ) -> Result<ByteStream, ServiceError> {
        let triples: Vec<Triple> = quads.map(|(spo, _)| spo).collect();
        let rendered = serialize_triples(triples, syntax)?;
        Ok(one_chunk(rendered.into_bytes()))
    }

    async fn update(
        &self,
        mut graph: Vec<Triple>,
        sparql: &str,
        base_url: &str,
    ) -> Result<Vec<Triple>, ServiceError> {
        // A minimal insert-only dialect, sufficient to drive the
        // pipeline from tests.
        let open = sparql
            .find('{')
            .ok_or_else(|| ServiceError::new("unsupported sparql-update operation"))?;
        let close = sparql[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| ServiceError::new("unsupported sparql-update operation"))?;
        let block = &sparql[open + 1..close];

        let source = format!("{}{} .", TEST_PREFIXES, block.trim().trim_end_matches('.'));
        let inserted = parse_turtle(&source, base_url)?;
        graph.extend(inserted);
        Ok(graph)
    }
}

/// A constraint service enforcing the range rule the repository
/// ships with: an rdf type assertion must not have a literal
/// object.
#[derive(Default)]
pub struct LiteralTypeConstraintService;

#[async_trait]
impl ConstraintService for LiteralTypeConstraintService {
    async fn constrained_by(
        &self,
        _interaction_model: InteractionModel,
        _base_url: &str,
        graph: &[Triple],
    ) -> Option<Violation> {
        let type_iri = ns::rdf::type_.to_string();
        let offending: Vec<Triple> = graph
            .iter()
            .filter(|[_, p, o]| term::is_iri(p, &type_iri) && o.lexical_form().is_some())
            .cloned()
            .collect();
        if offending.is_empty() {
            None
        } else {
            Some(Violation {
                constraint: trellis::InvalidRange.to_owned(),
                triples: offending,
            })
        }
    }
}

/// An access control service granting every mode.
#[derive(Default)]
pub struct OpenAccessControlService;

#[async_trait]
impl AccessControlService for OpenAccessControlService {
    async fn access_modes(
        &self,
        _identifier: &TrellisIdentifier,
        _session: &Session,
    ) -> Result<HashSet<AccessMode>, ServiceError> {
        Ok([
            AccessMode::Read,
            AccessMode::Write,
            AccessMode::Append,
            AccessMode::Control,
        ]
        .into_iter()
        .collect())
    }
}

/// An agent service mapping iri shaped user ids through, and
/// everything else to the anonymous agent.
#[derive(Default)]
pub struct SimpleAgentService;

impl AgentService for SimpleAgentService {
    fn as_agent(&self, user_id: &str) -> String {
        if user_id.contains(':') {
            user_id.to_owned()
        } else {
            trellis::AnonymousAgent.to_owned()
        }
    }
}
