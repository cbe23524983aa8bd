//! The cache-busting fingerprint.
//!
//! A deliberately weak, cheap digest over `(file name, file size)` pairs
//! rather than file contents. Two directories with identical names and
//! sizes in identical order fingerprint identically even when contents
//! differ. That is the documented tradeoff: this is a cache-busting token
//! for output file names, not an integrity check.

/// Accumulating MD5 digest over accepted source files.
///
/// Must receive exactly one [`Fingerprint::update`] per accepted file,
/// in feed order, before that file's glyph is created.
pub struct Fingerprint {
    context: md5::Context,
}

impl Fingerprint {
    /// Start a fresh accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }

    /// Fold one accepted file into the digest. The hashed bytes are the
    /// literal concatenation `{name}{size};` for byte-for-byte
    /// reproducibility across runs and platforms.
    pub fn update(&mut self, name: &str, size: u64) {
        self.context.consume(name.as_bytes());
        self.context.consume(size.to_string().as_bytes());
        self.context.consume(b";");
    }

    /// Finish and return the lowercase hex digest.
    #[must_use]
    pub fn finalize(self) -> String {
        format!("{:x}", self.context.compute())
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_literal_concatenation() {
        let mut fp = Fingerprint::new();
        fp.update("alpha.svg", 120);
        fp.update("beta.eps", 3456);
        let expected = format!("{:x}", md5::compute("alpha.svg120;beta.eps3456;"));
        assert_eq!(fp.finalize(), expected);
    }

    #[test]
    fn digest_is_pure_over_name_size_pairs() {
        let mut a = Fingerprint::new();
        a.update("x.svg", 10);
        a.update("y.svg", 20);
        let mut b = Fingerprint::new();
        b.update("x.svg", 10);
        b.update("y.svg", 20);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn order_matters() {
        let mut a = Fingerprint::new();
        a.update("x.svg", 10);
        a.update("y.svg", 20);
        let mut b = Fingerprint::new();
        b.update("y.svg", 20);
        b.update("x.svg", 10);
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn size_matters() {
        let mut a = Fingerprint::new();
        a.update("x.svg", 10);
        let mut b = Fingerprint::new();
        b.update("x.svg", 11);
        assert_ne!(a.finalize(), b.finalize());
    }
}
