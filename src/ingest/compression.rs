//! Key compression for the bulk-load vertex cache
//!
//! External IDs are frequently IRIs that share a handful of long prefixes.
//! [`UrlCompression`] replaces each distinct prefix with a short base-36 code
//! so the cache stores `"0$alice"` instead of `"http://example.com/people/alice"`.

use rustc_hash::FxHashMap;

/// Maps a raw external ID string to a shorter canonical key
///
/// Implementations must be deterministic: equal inputs always produce equal
/// outputs for the lifetime of the instance.
pub trait Compression {
    fn compress(&mut self, raw: &str) -> String;
}

impl<C: Compression + ?Sized> Compression for Box<C> {
    fn compress(&mut self, raw: &str) -> String {
        (**self).compress(raw)
    }
}

/// Leaves keys unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompression;

impl Compression for IdentityCompression {
    fn compress(&mut self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Separates the prefix code from the suffix
pub const PREFIX_SEPARATOR: char = '$';

const DELIMITERS: [char; 3] = ['/', '#', ':'];
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Prefix-table compression for URL-like IDs
///
/// The prefix is everything up to and including the right-most `/`, `#` or
/// `:`. Codes are handed out in first-seen order and never reused; the table
/// only grows.
#[derive(Debug, Default)]
pub struct UrlCompression {
    prefixes: FxHashMap<String, String>,
}

impl UrlCompression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct prefixes seen so far
    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    fn code_for(&mut self, prefix: &str) -> &str {
        if !self.prefixes.contains_key(prefix) {
            let mut code = to_base36(self.prefixes.len() as u64);
            code.push(PREFIX_SEPARATOR);
            self.prefixes.insert(prefix.to_string(), code);
        }
        &self.prefixes[prefix]
    }
}

impl Compression for UrlCompression {
    fn compress(&mut self, raw: &str) -> String {
        let split = raw
            .rfind(|c: char| DELIMITERS.contains(&c))
            .map_or(0, |pos| pos + 1);
        let (prefix, suffix) = raw.split_at(split);
        let code = self.code_for(prefix);

        let mut compressed = String::with_capacity(code.len() + suffix.len());
        compressed.push_str(code);
        compressed.push_str(suffix);
        compressed
    }
}

/// Most-significant digit first, `0` for zero
fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    // digits are ASCII
    digits.into_iter().map(char::from).collect()
}
