//! Card identifier generation
//!
//! Identifiers are random UUIDs (v4) drawn from the operating system's
//! secure random source. When that source is unavailable the generator
//! falls back to a base-36 composite of a pseudo-random value and the
//! current timestamp, which is collision-resistant enough for a single
//! user in a single process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;
use uuid::Uuid;

/// Source of secure random bytes
pub trait EntropySource {
    /// Fill `buf` with random bytes, or report that the source is unavailable
    fn fill(&self, buf: &mut [u8; 16]) -> Result<(), getrandom::Error>;
}

/// The operating system's secure random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8; 16]) -> Result<(), getrandom::Error> {
        getrandom::getrandom(buf)
    }
}

/// Produces unique string identifiers for new cards
#[derive(Debug, Clone, Default)]
pub struct IdGenerator<E = OsEntropy> {
    entropy: E,
}

impl IdGenerator<OsEntropy> {
    pub fn new() -> Self {
        Self { entropy: OsEntropy }
    }
}

impl<E: EntropySource> IdGenerator<E> {
    /// Create a generator backed by a specific entropy source
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Generate a new identifier. Never fails.
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; 16];
        match self.entropy.fill(&mut bytes) {
            Ok(()) => uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .hyphenated()
                .to_string(),
            Err(e) => {
                warn!("Secure random source unavailable ({}), using fallback id", e);
                fallback_id()
            }
        }
    }
}

/// Generate an identifier with the default generator
pub fn generate_id() -> String {
    IdGenerator::new().generate()
}

/// True if `id` has the shape of an identifier from the secure path
pub fn is_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// base36(pseudo-random) followed by base36(epoch millis)
fn fallback_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    let seed = (now.as_nanos() as u64)
        ^ (u64::from(std::process::id()) << 32)
        ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let random = splitmix64(seed);

    let mut id = to_base36(random);
    id.push_str(&to_base36(now.as_millis() as u64));
    id
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    // Only ASCII digits were pushed
    String::from_utf8(buf).unwrap_or_default()
}
