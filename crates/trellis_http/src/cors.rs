//! I define middleware to handle cors semantics against a
//! configured origin allow list.
//!

use std::task::{Context, Poll};

use http::{
    header::{
        HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
        ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
    },
    HeaderMap, Method, Request, Response,
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

/// Methods a cross origin request may use without preflight.
const SIMPLE_METHODS: &[Method] = &[Method::GET, Method::HEAD, Method::POST];

/// Configuration of the cors filter.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Origins allowed to make cross origin requests.
    pub allow_origins: Vec<String>,

    /// Methods the server accepts cross origin.
    pub allow_methods: Vec<Method>,

    /// Header names a preflight may request.
    pub allow_headers: Vec<String>,

    /// Value of `Access-Control-Max-Age`, in seconds.
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec![],
            allow_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::OPTIONS,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ],
            allow_headers: vec![
                "accept".to_owned(),
                "accept-datetime".to_owned(),
                "content-type".to_owned(),
                "digest".to_owned(),
                "link".to_owned(),
                "prefer".to_owned(),
                "range".to_owned(),
                "slug".to_owned(),
                "want-digest".to_owned(),
            ],
            max_age: 180,
        }
    }
}

impl CorsConfig {
    fn origin_allowed(&self, origin: &str) -> bool {
        self.allow_origins.iter().any(|o| o == origin || o == "*")
    }

    fn header_allowed(&self, name: &str) -> bool {
        self.allow_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }

    /// The non simple subset of the allowed methods, advertised on
    /// a valid preflight.
    fn non_simple_methods(&self) -> Vec<&Method> {
        self.allow_methods
            .iter()
            .filter(|m| !SIMPLE_METHODS.contains(m))
            .collect()
    }
}

/// A [`Layer`] applying the cors filter.
#[derive(Debug, Clone)]
pub struct CorsLayer {
    config: CorsConfig,
}

impl CorsLayer {
    /// Create a new layer with given configuration.
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = Cors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cors {
            inner,
            config: self.config.clone(),
        }
    }
}

/// The cors filter middleware. For a non matching origin no cors
/// headers are emitted and the request proceeds untouched.
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    config: CorsConfig,
}

/// Decision taken for one request.
enum Decision {
    Passthrough,
    Simple(HeaderValue),
    Preflight(HeaderValue, bool),
}

impl<S> Cors<S> {
    fn decide(config: &CorsConfig, method: &Method, headers: &HeaderMap) -> Decision {
        let Some(origin) = headers
            .get(ORIGIN)
            .filter(|o| o.to_str().map(|o| config.origin_allowed(o)).unwrap_or(false))
            .cloned()
        else {
            return Decision::Passthrough;
        };

        let requested_method = headers
            .get(ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Method>().ok());

        let Some(requested_method) = requested_method.filter(|_| method == Method::OPTIONS) else {
            return Decision::Simple(origin);
        };

        let method_ok = config.allow_methods.contains(&requested_method);
        let headers_ok = headers
            .get_all(ACCESS_CONTROL_REQUEST_HEADERS)
            .iter()
            .all(|value| {
                value
                    .to_str()
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|h| !h.is_empty())
                            .all(|h| config.header_allowed(h))
                    })
                    .unwrap_or(false)
            });

        Decision::Preflight(origin, method_ok && headers_ok)
    }

    fn apply(config: &CorsConfig, decision: Decision, headers: &mut HeaderMap) {
        match decision {
            Decision::Passthrough => {}
            Decision::Simple(origin) => {
                Self::basic_pair(origin, headers);
            }
            Decision::Preflight(origin, valid) => {
                Self::basic_pair(origin, headers);
                if valid {
                    headers.insert(
                        ACCESS_CONTROL_MAX_AGE,
                        HeaderValue::from_str(&config.max_age.to_string())
                            .expect("Must be a valid HeaderValue"),
                    );
                    let methods = config
                        .non_simple_methods()
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    if let Ok(value) = HeaderValue::from_str(&methods) {
                        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
                    }
                    if let Ok(value) = HeaderValue::from_str(&config.allow_headers.join(", ")) {
                        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, value);
                    }
                } else {
                    debug!("Preflight request not satisfiable; emitting basic pair only.");
                }
            }
        }
    }

    fn basic_pair(origin: HeaderValue, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.append(http::header::VARY, HeaderValue::from_name(ORIGIN));
    }
}

impl<S, ReqBody, RespBody> Service<Request<ReqBody>> for Cors<S>
where
    S: Service<Request<ReqBody>, Response = Response<RespBody>>,
    S::Future: Send + 'static,
{
    type Response = Response<RespBody>;

    type Error = S::Error;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let decision = Self::decide(&self.config, req.method(), req.headers());
        let config = self.config.clone();
        let future = self.inner.call(req);

        Box::pin(async move {
            let mut response = future.await?;
            Cors::<S>::apply(&config, decision, response.headers_mut());
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use claims::assert_ok;
    use http::header::HeaderName;
    use tower::{service_fn, ServiceExt};

    use super::*;

    fn config() -> CorsConfig {
        CorsConfig {
            allow_origins: vec!["http://app.example".to_owned()],
            ..Default::default()
        }
    }

    async fn run(
        method: Method,
        header_pairs: &[(HeaderName, &str)],
    ) -> Response<&'static str> {
        let mut req = Request::builder().method(method);
        for (name, value) in header_pairs {
            req = req.header(name, *value);
        }
        let req = req.body("").unwrap();

        let service = CorsLayer::new(config()).layer(service_fn(|_req: Request<&str>| async {
            Ok::<_, Infallible>(Response::new(""))
        }));
        assert_ok!(service.oneshot(req).await)
    }

    #[tokio::test]
    async fn foreign_origins_get_no_cors_headers() {
        let response = run(
            Method::GET,
            &[(ORIGIN, "http://evil.example")],
        )
        .await;
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn matching_origins_get_the_basic_pair() {
        let response = run(Method::GET, &[(ORIGIN, "http://app.example")]).await;
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://app.example"
        );
        assert_eq!(
            response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn valid_preflights_get_the_full_set() {
        let response = run(
            Method::OPTIONS,
            &[
                (ORIGIN, "http://app.example"),
                (ACCESS_CONTROL_REQUEST_METHOD, "PUT"),
                (ACCESS_CONTROL_REQUEST_HEADERS, "Content-Type, Slug"),
            ],
        )
        .await;
        assert!(response.headers().contains_key(ACCESS_CONTROL_MAX_AGE));
        let methods = response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("PUT"));
        assert!(!methods.contains("GET"));
    }

    #[tokio::test]
    async fn invalid_preflights_get_the_basic_pair_only() {
        let response = run(
            Method::OPTIONS,
            &[
                (ORIGIN, "http://app.example"),
                (ACCESS_CONTROL_REQUEST_METHOD, "PUT"),
                (ACCESS_CONTROL_REQUEST_HEADERS, "X-Custom-Secret"),
            ],
        )
        .await;
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(response.headers().get(ACCESS_CONTROL_MAX_AGE).is_none());
        assert!(response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .is_none());
    }
}
