//! I define the method dispatch service: it parses the target and
//! the repository request, routes to the method handlers and the
//! upload controller, and marshals errors into problem responses.
//!

use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};

use chrono::Utc;
use futures::future::BoxFuture;
use http::{Method, Request, Response};
use http_body_util::BodyExt;
use tower::Service;
use tracing::debug;
use trellis_api::{
    identifier::TrellisIdentifier,
    model::Session,
    service::{AgentService, ByteStream},
};

use crate::{
    body::Body,
    config::LdpConfig,
    error::LdpError,
    handler::{DeleteHandler, GetHandler, OptionsHandler, PatchHandler, PostHandler, PutHandler},
    multipart::{MultipartController, UploadTarget, UPLOAD_PREFIX},
    request::{Ext, LdpRequest},
    Collaborators,
};

/// The repository http service over one set of collaborators.
/// Handlers are stateless; all per request state lives on the
/// task's own frame.
pub struct LdpService {
    get: Arc<GetHandler>,
    options: Arc<OptionsHandler>,
    post: Arc<PostHandler>,
    put: Arc<PutHandler>,
    patch: Arc<PatchHandler>,
    delete: Arc<DeleteHandler>,
    multipart: Arc<MultipartController>,
    agents: Arc<dyn AgentService>,
}

impl Clone for LdpService {
    fn clone(&self) -> Self {
        Self {
            get: self.get.clone(),
            options: self.options.clone(),
            post: self.post.clone(),
            put: self.put.clone(),
            patch: self.patch.clone(),
            delete: self.delete.clone(),
            multipart: self.multipart.clone(),
            agents: self.agents.clone(),
        }
    }
}

impl LdpService {
    /// Create a new service over given collaborators and
    /// configuration.
    pub fn new(collaborators: Collaborators, config: LdpConfig) -> Self {
        let config = Arc::new(config);
        Self {
            get: Arc::new(GetHandler::new(collaborators.clone(), config.clone())),
            options: Arc::new(OptionsHandler::new(collaborators.clone(), config.clone())),
            post: Arc::new(PostHandler::new(collaborators.clone(), config.clone())),
            put: Arc::new(PutHandler::new(collaborators.clone(), config.clone())),
            patch: Arc::new(PatchHandler::new(collaborators.clone(), config.clone())),
            delete: Arc::new(DeleteHandler::new(collaborators.clone(), config.clone())),
            agents: collaborators.agents.clone(),
            multipart: Arc::new(MultipartController::new(collaborators, config)),
        }
    }

    async fn dispatch(self, req: Request<Body>) -> Result<Response<Body>, LdpError> {
        let (parts, raw_body) = req.into_parts();

        let path = parts.uri.path().trim_start_matches('/').to_owned();
        let query = parts.uri.query().unwrap_or("").to_owned();

        // The agent session is attached by the outer
        // authenticator; anonymous otherwise. A delegating agent
        // may be named through `On-Behalf-Of`.
        let mut session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .unwrap_or_else(|| Session::anonymous(Utc::now()));
        if let Some(principal) = parts
            .headers
            .get("on-behalf-of")
            .and_then(|v| v.to_str().ok())
        {
            session.delegated_by = Some(self.agents.as_agent(principal));
        }

        let body_stream: Option<ByteStream> = if [
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::DELETE,
        ]
        .contains(&parts.method)
        {
            None
        } else {
            Some(Box::pin(raw_body.into_data_stream()))
        };

        // The upload session space lives beside the partitions.
        if let Some(session_path) = path.strip_prefix(&format!("{}/", UPLOAD_PREFIX)) {
            let target =
                UploadTarget::parse(session_path).ok_or(LdpError::NotFound)?;
            debug!("Dispatching into upload session space: {:?}", target);
            return self
                .multipart
                .handle_session(parts.method, target, session, body_stream)
                .await;
        }

        let identifier =
            TrellisIdentifier::from_internal(&format!("trellis:{}", path))
                .map_err(|_| LdpError::NotFound)?;

        let req = LdpRequest::new(
            parts.method.clone(),
            identifier,
            &query,
            parts.headers,
            session,
            body_stream,
        )?;

        let method = parts.method;
        if method == Method::GET || method == Method::HEAD {
            self.get.handle(req).await
        } else if method == Method::OPTIONS {
            self.options.handle(req).await
        } else if method == Method::POST && req.ext == Ext::Upload {
            self.multipart.initiate(req).await
        } else if method == Method::POST {
            self.post.handle(req).await
        } else if method == Method::PUT {
            self.put.handle(req).await
        } else if method == Method::PATCH {
            self.patch.handle(req).await
        } else if method == Method::DELETE {
            self.delete.handle(req).await
        } else {
            Err(LdpError::MethodNotAllowed)
        }
    }
}

impl Service<Request<Body>> for LdpService {
    type Response = Response<Body>;

    type Error = Infallible;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    #[inline]
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    #[tracing::instrument(skip_all, name = "LdpService::call")]
    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move {
            Ok(match service.dispatch(req).await {
                Ok(response) => response,
                Err(error) => error.to_response(),
            })
        })
    }
}
