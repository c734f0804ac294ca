//! This crate implements client-side HTTP Digest Authentication as specified by IETF RFC 2617,
//! packaged as a request/response filter pair for an HTTP client pipeline built on the
//! [`http`] crate types.
//!
//! The response filter answers a `401` carrying `WWW-Authenticate: Digest ...` by repeating
//! the request once with an `Authorization` header. When the server accepts it, the negotiated
//! scheme is remembered per target URI, so later requests to the same target are signed up front
//! by the request filter, with the nonce count advancing on every reuse.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```
//! use digest_auth_filter::{DigestAuthenticator, Retried};
//! use http::{header, Request, Response, StatusCode};
//!
//! let auth = DigestAuthenticator::builder()
//!     .credentials("Mufasa", "Circle Of Life")
//!     .build()?;
//!
//! // Nothing is known about this target yet, so the request goes out unsigned
//! let mut request = Request::get("http://example.com/dir/index.html").body(())?;
//! assert!(!auth.filter_request(&mut request)?);
//!
//! // ... and the server challenges it
//! let challenge = Response::builder()
//!     .status(StatusCode::UNAUTHORIZED)
//!     .header(
//!         header::WWW_AUTHENTICATE,
//!         r#"Digest realm="testrealm@host.com", qop="auth", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093""#,
//!     )
//!     .body(())?;
//!
//! // The closure is where the transport re-sends the request with the computed header.
//! // Here the server simply accepts it.
//! let verdict = auth.filter_response(&request, &challenge, |authorization| {
//!     assert!(authorization.to_str().unwrap().starts_with(r#"Digest username="Mufasa""#));
//!     Retried::new(Response::new(()), true)
//! })?;
//! assert!(verdict.is_success());
//!
//! // The next request to the same target is signed without another round trip
//! let mut next = Request::get("http://example.com/dir/index.html").body(())?;
//! assert!(auth.filter_request(&mut next)?);
//! assert!(next.headers()[header::AUTHORIZATION].to_str()?.contains("nc=00000002"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The digest computation can also be used on its own:
//!
//! ```
//! use digest_auth_filter::AuthContext;
//!
//! let www_authenticate = r#"Digest realm="http-auth@example.org", qop="auth, auth-int", algorithm=MD5, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;
//!
//! let mut context = AuthContext::new("Mufasa", "Circle of Life", "/dir/index.html");
//! // For this test, we inject a custom cnonce. It's generated for you otherwise.
//! context.set_custom_cnonce("f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ");
//!
//! let prompt = digest_auth_filter::parse(www_authenticate).unwrap().unwrap();
//!
//! let answer = prompt.respond(&context).to_string();
//! assert_eq!(answer, r#"Digest username="Mufasa", realm="http-auth@example.org", nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS", algorithm=MD5, qop=auth, uri="/dir/index.html", cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ", nc=00000001, response="8ca523f5e9506fed4657c9700eebdbec""#);
//!
//! // The nonce count lives inside the scheme and is advanced on every response
//! assert_eq!(prompt.nc().current(), 1);
//! ```

mod authenticator;
mod cache;
mod digest;
mod enums;
mod error;
mod nonce;
mod utils;

pub use error::{Error, Result};

pub use crate::authenticator::{
    CredentialResolver, Credentials, DigestAuthenticator, DigestAuthenticatorBuilder,
    DigestConfig, RequestCredentials, ResponseVerdict, Retried, DEFAULT_CACHE_CAPACITY,
};
pub use crate::cache::SchemeCache;
pub use crate::digest::{
    parse_challenges, parse_www_authenticate, AuthContext, AuthorizationHeader, DigestScheme,
};
pub use crate::enums::*;
pub use crate::nonce::NonceCounter;

/// Parse one WWW-Authenticate header value.
/// It's just a convenience method to call [`DigestScheme::parse()`](struct.DigestScheme.html#method.parse).
pub fn parse(www_authenticate: &str) -> Result<Option<DigestScheme>> {
    DigestScheme::parse(www_authenticate)
}

#[test]
fn test_parse_respond() {
    let src = r#"
    Digest
       realm="http-auth@example.org",
       qop="auth, auth-int",
       algorithm=MD5,
       nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
       opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"
    "#;

    let mut context = AuthContext::new("Mufasa", "Circle of Life", "/dir/index.html");
    context.set_custom_cnonce("f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ");

    let prompt = crate::parse(src).unwrap().unwrap();
    let answer = prompt.respond(&context);

    let str = answer.to_string().replace(", ", ",\n  ");

    assert_eq!(
        str,
        r#"
Digest username="Mufasa",
  realm="http-auth@example.org",
  nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
  opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS",
  algorithm=MD5,
  qop=auth,
  uri="/dir/index.html",
  cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
  nc=00000001,
  response="8ca523f5e9506fed4657c9700eebdbec"
"#
        .trim()
    );
}
