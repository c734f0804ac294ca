use crate::{
    parse_www_authenticate, Algorithm, AuthContext, DigestScheme, Error, Result, SchemeCache,
};
use http::header::{HeaderValue, AUTHORIZATION};
use http::{Extensions, Method, Request, Response, StatusCode, Uri};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Default number of targets remembered by [`SchemeCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

//region Credentials

/// Username and password pair.
///
/// Attach one to a request's extensions to override the authenticator's
/// default credentials for that request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Finds the credentials to answer a digest challenge with.
pub trait CredentialResolver: Send + Sync {
    fn resolve(
        &self,
        method: &Method,
        uri: &Uri,
        extensions: &Extensions,
        defaults: Option<&Credentials>,
    ) -> Option<Credentials>;
}

/// Per-request [`Credentials`] from the request extensions, else the defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestCredentials;

impl CredentialResolver for RequestCredentials {
    fn resolve(
        &self,
        _method: &Method,
        _uri: &Uri,
        extensions: &Extensions,
        defaults: Option<&Credentials>,
    ) -> Option<Credentials> {
        extensions.get::<Credentials>().or(defaults).cloned()
    }
}

impl<F> CredentialResolver for F
where
    F: Fn(&Method, &Uri, &Extensions, Option<&Credentials>) -> Option<Credentials> + Send + Sync,
{
    fn resolve(
        &self,
        method: &Method,
        uri: &Uri,
        extensions: &Extensions,
        defaults: Option<&Credentials>,
    ) -> Option<Credentials> {
        self(method, uri, extensions, defaults)
    }
}

//endregion

//region Config

/// Tunables for [`DigestAuthenticator`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DigestConfig {
    /// Maximum number of targets whose schemes are kept for preemptive auth
    pub cache_capacity: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

//endregion

//region Verdicts

/// Outcome of the single authenticated retry
#[derive(Debug)]
pub struct Retried<R> {
    /// Whatever the transport produced for the repeated request
    pub response: R,
    /// Whether the server accepted the credentials
    pub success: bool,
}

impl<R> Retried<R> {
    pub fn new(response: R, success: bool) -> Self {
        Self { response, success }
    }
}

/// What the response hook did
#[derive(Debug)]
pub enum ResponseVerdict<R> {
    /// Not a 401; the response passes through
    NotRequired,
    /// A 401 without a usable Digest challenge; the response passes through
    NotHandled,
    /// The request was repeated with an Authorization header
    Retried(Retried<R>),
}

impl<R> ResponseVerdict<R> {
    /// True unless authentication was required and did not succeed
    pub fn is_success(&self) -> bool {
        match self {
            ResponseVerdict::NotRequired => true,
            ResponseVerdict::NotHandled => false,
            ResponseVerdict::Retried(retried) => retried.success,
        }
    }
}

enum Prepared {
    Done(bool),
    Retry(Arc<DigestScheme>, HeaderValue),
}

//endregion

//region DigestAuthenticator

/// Request/response filter pair performing HTTP Digest authentication.
///
/// [`filter_request`](Self::filter_request) signs outgoing requests to targets
/// that already completed a challenge, and
/// [`filter_response`](Self::filter_response) answers 401 challenges by
/// repeating the request once. Safe to share between threads.
pub struct DigestAuthenticator {
    credentials: Option<Credentials>,
    resolver: Box<dyn CredentialResolver>,
    cache: SchemeCache,
}

impl fmt::Debug for DigestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestAuthenticator")
            .field("credentials", &self.credentials)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl DigestAuthenticator {
    pub fn builder() -> DigestAuthenticatorBuilder {
        DigestAuthenticatorBuilder::default()
    }

    /// Targets with a negotiated scheme
    pub fn cache(&self) -> &SchemeCache {
        &self.cache
    }

    /// Pre-request hook.
    ///
    /// If the target has a cached scheme and credentials resolve, appends an
    /// `Authorization` header and returns `true`. Requests that already carry
    /// an `Authorization` header are left alone.
    pub fn filter_request<B>(&self, request: &mut Request<B>) -> Result<bool> {
        if request.headers().contains_key(AUTHORIZATION) {
            return Ok(false);
        }

        let scheme = match self.cache.get(request.uri()) {
            Some(scheme) => scheme,
            None => return Ok(false),
        };

        let credentials = match self.resolve(request) {
            Some(credentials) => credentials,
            None => {
                tracing::debug!(uri = %request.uri(), "Cached digest scheme, but no credentials");
                return Ok(false);
            }
        };

        let value = authorization(&scheme, &credentials, request.method(), request.uri())?;
        request.headers_mut().append(AUTHORIZATION, value);

        tracing::debug!(
            uri = %request.uri(),
            nc = scheme.nc().current(),
            "Preemptive digest authorization"
        );
        Ok(true)
    }

    /// Post-response hook.
    ///
    /// On a 401 carrying a Digest challenge, computes the answer and calls
    /// `repeat` with the `Authorization` value to re-send the request. A
    /// successful retry caches the scheme for the target, a failed one evicts
    /// whatever was cached.
    ///
    /// # Errors
    /// [`Error::UnsupportedQop`] for a challenge we can't answer,
    /// [`Error::CredentialsMissing`] if nothing resolves; `repeat` is not
    /// called in either case.
    pub fn filter_response<B, RB, R, F>(
        &self,
        request: &Request<B>,
        response: &Response<RB>,
        repeat: F,
    ) -> Result<ResponseVerdict<R>>
    where
        F: FnOnce(HeaderValue) -> Retried<R>,
    {
        match self.prepare(request, response)? {
            Prepared::Done(true) => Ok(ResponseVerdict::NotRequired),
            Prepared::Done(false) => Ok(ResponseVerdict::NotHandled),
            Prepared::Retry(scheme, value) => {
                let retried = repeat(value);
                self.complete(request.uri(), scheme, retried.success);
                Ok(ResponseVerdict::Retried(retried))
            }
        }
    }

    /// [`filter_response`](Self::filter_response) for transports whose retry
    /// is asynchronous.
    pub async fn filter_response_async<B, RB, R, F, Fut>(
        &self,
        request: &Request<B>,
        response: &Response<RB>,
        repeat: F,
    ) -> Result<ResponseVerdict<R>>
    where
        F: FnOnce(HeaderValue) -> Fut,
        Fut: Future<Output = Retried<R>>,
    {
        match self.prepare(request, response)? {
            Prepared::Done(true) => Ok(ResponseVerdict::NotRequired),
            Prepared::Done(false) => Ok(ResponseVerdict::NotHandled),
            Prepared::Retry(scheme, value) => {
                let retried = repeat(value).await;
                self.complete(request.uri(), scheme, retried.success);
                Ok(ResponseVerdict::Retried(retried))
            }
        }
    }

    fn resolve<B>(&self, request: &Request<B>) -> Option<Credentials> {
        self.resolver.resolve(
            request.method(),
            request.uri(),
            request.extensions(),
            self.credentials.as_ref(),
        )
    }

    fn prepare<B, RB>(&self, request: &Request<B>, response: &Response<RB>) -> Result<Prepared> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(Prepared::Done(true));
        }

        let scheme = match parse_www_authenticate(response.headers())? {
            Some(scheme) => scheme,
            None => {
                tracing::debug!(uri = %request.uri(), "401 without a digest challenge");
                return Ok(Prepared::Done(false));
            }
        };

        if scheme.stale {
            tracing::trace!(uri = %request.uri(), "Server nonce went stale, renegotiating");
        }

        let credentials = self.resolve(request).ok_or(Error::CredentialsMissing)?;

        let value = authorization(&scheme, &credentials, request.method(), request.uri())?;
        Ok(Prepared::Retry(Arc::new(scheme), value))
    }

    fn complete(&self, uri: &Uri, scheme: Arc<DigestScheme>, success: bool) {
        if success {
            tracing::debug!(%uri, realm = %scheme.realm, "Digest authentication succeeded");
            self.cache.put(uri.clone(), scheme);
        } else {
            tracing::debug!(%uri, "Digest authentication rejected");
            self.cache.remove(uri);
        }
    }
}

/// Compute the `Authorization` value for one request against `scheme`
fn authorization(
    scheme: &DigestScheme,
    credentials: &Credentials,
    method: &Method,
    uri: &Uri,
) -> Result<HeaderValue> {
    let context = AuthContext::new_with_method(
        &credentials.username,
        &credentials.password,
        uri.path(),
        method.as_str(),
    );

    let mut value = HeaderValue::from_str(&scheme.respond(&context).to_header_string())?;
    value.set_sensitive(true);
    Ok(value)
}

/// Builder for [`DigestAuthenticator`]
#[derive(Default)]
pub struct DigestAuthenticatorBuilder {
    credentials: Option<Credentials>,
    config: DigestConfig,
    resolver: Option<Box<dyn CredentialResolver>>,
}

impl DigestAuthenticatorBuilder {
    /// Default credentials, used when a request carries none of its own
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn config(mut self, config: DigestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Replace the stock [`RequestCredentials`] lookup
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: CredentialResolver + 'static,
    {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// # Errors
    /// [`Error::DigestUnavailable`] if the digest function fails its self test.
    pub fn build(self) -> Result<DigestAuthenticator> {
        Algorithm::MD5.self_test()?;

        Ok(DigestAuthenticator {
            credentials: self.credentials,
            resolver: self
                .resolver
                .unwrap_or_else(|| Box::new(RequestCredentials)),
            cache: SchemeCache::new(self.config.cache_capacity),
        })
    }
}

//endregion
