use rand::Rng;

/// Number of random bytes in a client nonce
const CNONCE_BYTES: usize = 4;

/// slash quoting for digest strings
pub trait QuoteForDigest {
    fn quote_for_digest(&self) -> String;
}

impl QuoteForDigest for &str {
    fn quote_for_digest(&self) -> String {
        self.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

impl QuoteForDigest for String {
    fn quote_for_digest(&self) -> String {
        self.as_str().quote_for_digest()
    }
}

/// Fresh client nonce: hex of a few bytes from the thread-local CSPRNG.
pub fn random_cnonce() -> String {
    let bytes: [u8; CNONCE_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}
