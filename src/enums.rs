use crate::{Error, Result};
use std::str::FromStr;

use digest::DynDigest;
use md5::Md5;

/// Algorithm variant announced by the server
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Algorithm {
    /// No `algorithm` parameter was sent; hashed as MD5, not echoed back
    UNSPECIFIED,
    MD5,
    MD5_SESS,
}

impl Algorithm {
    /// Map an `algorithm` token to a variant.
    ///
    /// | token                                  | variant       |
    /// |----------------------------------------|---------------|
    /// | empty                                  | `UNSPECIFIED` |
    /// | contains `MD5-sess` (any letter case)  | `MD5_SESS`    |
    /// | anything else                          | `MD5`         |
    ///
    /// The last row is deliberately lenient: unknown algorithms such as
    /// `SHA-256` are answered with MD5 rather than rejected.
    pub fn from_token(token: &str) -> Algorithm {
        let token = token.trim();
        if token.is_empty() {
            Algorithm::UNSPECIFIED
        } else if token.to_ascii_lowercase().contains("md5-sess") {
            Algorithm::MD5_SESS
        } else {
            Algorithm::MD5
        }
    }

    /// True for the session variant, where HA1 also covers the nonces
    pub fn is_sess(self) -> bool {
        self == Algorithm::MD5_SESS
    }

    /// Value of the `algorithm` field in the Authorization header, if any
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Algorithm::UNSPECIFIED => None,
            Algorithm::MD5 => Some("MD5"),
            Algorithm::MD5_SESS => Some("MD5-sess"),
        }
    }

    /// Name of the digest function backing this variant
    pub fn digest_name(self) -> &'static str {
        "MD5"
    }

    /// Calculate a hash of bytes using the selected algorithm
    pub fn hash(self, bytes: &[u8]) -> String {
        // every variant digests with MD5; -sess only changes how HA1 is built
        let mut hash: Box<dyn DynDigest> = Box::new(Md5::default());

        hash.update(bytes);
        hex::encode(hash.finalize())
    }

    /// Hash the colon-joined parts, e.g. `user:realm:password`
    pub fn hash_parts(self, parts: &[&str]) -> String {
        self.hash(parts.join(":").as_bytes())
    }

    /// Known-answer test for the digest function, run once at construction
    pub(crate) fn self_test(self) -> Result<()> {
        const MD5_EMPTY: &str = "d41d8cd98f00b204e9800998ecf8427e";

        if self.hash(b"") == MD5_EMPTY {
            Ok(())
        } else {
            Err(Error::DigestUnavailable(self.digest_name()))
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::UNSPECIFIED
    }
}

/// QOP field values
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Qop {
    /// Legacy RFC 2069 computation, no cnonce or nc
    UNSPECIFIED,
    AUTH,
}

impl Qop {
    /// Value of the `qop` field in the Authorization header, if any
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Qop::UNSPECIFIED => None,
            Qop::AUTH => Some("auth"),
        }
    }
}

impl FromStr for Qop {
    type Err = Error;

    /// Parse the `qop` list offered by the server.
    ///
    /// Any offer mentioning `auth` (e.g. `"auth,auth-int"`) selects `AUTH`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            Ok(Qop::UNSPECIFIED)
        } else if s.contains("auth") {
            Ok(Qop::AUTH)
        } else {
            Err(Error::UnsupportedQop(s.into()))
        }
    }
}

impl Default for Qop {
    fn default() -> Self {
        Qop::UNSPECIFIED
    }
}
