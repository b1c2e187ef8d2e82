//! I define the immutable configuration value handlers are
//! constructed with.
//!

/// Configuration of the protocol core. One immutable value, passed
/// by reference into every handler at construction time.
#[derive(Debug, Clone)]
pub struct LdpConfig {
    /// Base url the repository is served under. Always ends with
    /// `/`.
    pub base_url: String,

    /// Value of `Cache-Control: max-age=<N>` on successful
    /// responses, in seconds.
    pub cache_max_age: u32,
}

impl LdpConfig {
    /// Create a new configuration with given base url. A missing
    /// trailing slash is appended.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url: String = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            cache_max_age: 86400,
        }
    }

    /// Set the cache max-age.
    pub fn with_cache_max_age(mut self, max_age: u32) -> Self {
        self.cache_max_age = max_age;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_always_ends_with_slash() {
        assert_eq!(LdpConfig::new("http://example.org").base_url, "http://example.org/");
        assert_eq!(LdpConfig::new("http://example.org/").base_url, "http://example.org/");
    }
}
