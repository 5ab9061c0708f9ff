//! Hash dump parsing.
//!
//! Dumps come in several shapes and are rarely labelled, so every line is
//! offered to an ordered chain of [`LineClassifier`]s. The first classifier
//! whose structural test accepts the line decides its fate; later ones never
//! see it. The default chain, in priority order:
//!
//! 1. [`SecretsdumpLine`]: `DOMAIN\user:rid:lmhash:nthash:::` (4+ fields, the
//!    4th is the hash)
//! 2. [`BareHashLine`]: a lone 32 character hex token
//! 3. [`UserHashLine`]: `user:hash` (exactly 2 fields, hash must be 32 chars)
//!
//! Accepted hashes are lowercased and tallied in [`HashUsage`], keeping the
//! order in which each hash was first seen.
use indexmap::IndexMap;
use log::debug;

/// Well-known null LM hash value.
pub const NULL_HASH_LM: &str = "aad3b435b51404eeaad3b435b51404ee";
/// Well-known null NT hash value (empty password).
pub const NULL_HASH_NT: &str = "31d6cfe0d16ae931b73c59d7e0c089c0";

/// Length of an LM/NT hash in hex characters.
pub const HASH_HEX_LEN: usize = 32;

const MAX_UNRECOGNIZED_LOGGED: usize = 10;
const PREVIEW_LINES: usize = 5;

/// Whether `hash` (already lowercased) stands for "no credential".
pub fn is_placeholder(hash: &str) -> bool {
    hash == NULL_HASH_LM || hash == NULL_HASH_NT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    Secretsdump,
    BareHash,
    UserHash,
}

impl LineFormat {
    pub fn describe(self) -> &'static str {
        match self {
            LineFormat::Secretsdump => "domain\\username:rid:lmhash:nthash:::",
            LineFormat::BareHash => "hash only (32 characters)",
            LineFormat::UserHash => "username:hash",
        }
    }
}

/// Reasons a line with a recognised shape still yields no hash.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DumpError {
    #[error("placeholder hash {0}")]
    Placeholder(String),
    #[error("empty hash field")]
    EmptyHash,
    #[error("candidate hash {0:?} is not 32 characters")]
    BadLength(String),
}

/// One link of the format detection chain.
///
/// `classify` returns `None` when the line does not have this format's
/// shape, letting the next classifier try. `Some(Err(_))` claims the line
/// but discards it.
pub trait LineClassifier {
    fn format(&self) -> LineFormat;
    fn classify(&self, line: &str) -> Option<Result<String, DumpError>>;
}

fn normalize(candidate: &str) -> Result<String, DumpError> {
    let hash = candidate.trim().to_lowercase();
    if hash.is_empty() {
        return Err(DumpError::EmptyHash);
    }
    if is_placeholder(&hash) {
        return Err(DumpError::Placeholder(hash));
    }
    Ok(hash)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecretsdumpLine;

impl LineClassifier for SecretsdumpLine {
    fn format(&self) -> LineFormat {
        LineFormat::Secretsdump
    }

    fn classify(&self, line: &str) -> Option<Result<String, DumpError>> {
        let nt = line.split(':').nth(3)?;
        Some(normalize(nt))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BareHashLine;

impl LineClassifier for BareHashLine {
    fn format(&self) -> LineFormat {
        LineFormat::BareHash
    }

    fn classify(&self, line: &str) -> Option<Result<String, DumpError>> {
        let token = line.trim();
        if token.len() != HASH_HEX_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(normalize(token))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserHashLine;

impl LineClassifier for UserHashLine {
    fn format(&self) -> LineFormat {
        LineFormat::UserHash
    }

    fn classify(&self, line: &str) -> Option<Result<String, DumpError>> {
        let mut parts = line.split(':');
        let (_user, hash) = (parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let hash = hash.trim();
        if hash.chars().count() != HASH_HEX_LEN {
            return Some(Err(DumpError::BadLength(hash.to_string())));
        }
        Some(normalize(hash))
    }
}

/// The classifiers in their fixed priority order.
pub fn default_classifiers() -> Vec<Box<dyn LineClassifier + Send + Sync>> {
    vec![
        Box::new(SecretsdumpLine),
        Box::new(BareHashLine),
        Box::new(UserHashLine),
    ]
}

/// Blank lines and `#` comments are never offered to the classifiers.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn classify_with(
    chain: &[Box<dyn LineClassifier + Send + Sync>],
    line: &str,
) -> Option<(LineFormat, Result<String, DumpError>)> {
    chain
        .iter()
        .find_map(|c| c.classify(line).map(|res| (c.format(), res)))
}

/// Occurrence count per lowercase hash, in first-seen order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HashUsage {
    counts: IndexMap<String, u64>,
}

impl HashUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hash: String) {
        *self.counts.entry(hash).or_insert(0) += 1;
    }

    pub fn get(&self, hash: &str) -> u64 {
        self.counts.get(hash).copied().unwrap_or(0)
    }

    /// Number of distinct hashes.
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// Number of account lines counted.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(h, c)| (h.as_str(), *c))
    }
}

/// Counters describing how a dump was consumed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpStats {
    pub lines: usize,
    pub skipped: usize,
    pub secretsdump: usize,
    pub bare_hash: usize,
    pub user_hash: usize,
    pub placeholders: usize,
    pub rejected: usize,
    pub unrecognized: usize,
}

impl DumpStats {
    /// Lines that contributed to [`HashUsage`].
    pub fn counted(&self) -> usize {
        self.secretsdump + self.bare_hash + self.user_hash
    }
}

/// Line-at-a-time builder for [`HashUsage`].
pub struct HashUsageParser {
    classifiers: Vec<Box<dyn LineClassifier + Send + Sync>>,
    usage: HashUsage,
    stats: DumpStats,
    detected: Vec<LineFormat>,
    preview: Vec<String>,
}

impl Default for HashUsageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HashUsageParser {
    pub fn new() -> Self {
        Self::with_classifiers(default_classifiers())
    }

    pub fn with_classifiers(classifiers: Vec<Box<dyn LineClassifier + Send + Sync>>) -> Self {
        Self {
            classifiers,
            usage: HashUsage::new(),
            stats: DumpStats::default(),
            detected: Vec::new(),
            preview: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.stats.lines += 1;
        if self.preview.len() < PREVIEW_LINES {
            self.preview.push(line.trim().to_string());
        }
        if is_skippable(line) {
            self.stats.skipped += 1;
            return;
        }
        let line = line.trim();
        match classify_with(&self.classifiers, line) {
            Some((format, Ok(hash))) => {
                if !self.detected.contains(&format) {
                    debug!("detected format: {}", format.describe());
                    self.detected.push(format);
                }
                match format {
                    LineFormat::Secretsdump => self.stats.secretsdump += 1,
                    LineFormat::BareHash => self.stats.bare_hash += 1,
                    LineFormat::UserHash => self.stats.user_hash += 1,
                }
                self.usage.record(hash);
            }
            Some((_, Err(DumpError::Placeholder(_)))) => self.stats.placeholders += 1,
            Some((_, Err(_))) => self.stats.rejected += 1,
            None => {
                self.stats.unrecognized += 1;
                if self.stats.unrecognized <= MAX_UNRECOGNIZED_LOGGED {
                    debug!("line {} not recognized: {}", self.stats.lines, line);
                }
            }
        }
    }

    /// Formats seen so far, in detection order.
    pub fn detected_formats(&self) -> &[LineFormat] {
        &self.detected
    }

    /// The first few raw lines, trimmed, whatever their shape.
    pub fn preview(&self) -> &[String] {
        &self.preview
    }

    pub fn finish(self) -> (HashUsage, DumpStats) {
        (self.usage, self.stats)
    }
}

/// Parse a whole in-memory dump with the default chain.
pub fn parse_dump_contents(contents: &str) -> (HashUsage, DumpStats) {
    let mut parser = HashUsageParser::new();
    for line in contents.lines() {
        parser.push_line(line);
    }
    parser.finish()
}
