//! Cracked-hash (potfile style) loading.
//!
//! Each line is `hash:plaintext`. Only the first `:` splits, so plaintexts
//! may themselves contain colons. Hashes are lowercased for lookup while the
//! plaintext is kept exactly as written.
use std::collections::HashMap;

use log::info;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PotError {
    #[error("malformed pot line: {0}")]
    MalformedLine(String),
    #[error("hash {0} has no plaintext")]
    EmptyPlaintext(String),
}

/// Split a line into `(normalized_hash, plaintext)`.
pub fn parse_pot_line(line: &str) -> Result<(String, String), PotError> {
    let (hash, plaintext) = line
        .split_once(':')
        .ok_or_else(|| PotError::MalformedLine(line.to_string()))?;
    let hash = hash.trim().to_lowercase();
    if plaintext.trim().is_empty() {
        return Err(PotError::EmptyPlaintext(hash));
    }
    Ok((hash, plaintext.to_string()))
}

/// Counters describing how a cracked-hash input was consumed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PotStats {
    pub loaded: usize,
    pub malformed: usize,
    pub uncracked: usize,
}

/// Lookup table from lowercase hash to recovered plaintext.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrackMap {
    entries: HashMap<String, String>,
    stats: PotStats,
}

impl CrackMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line. Blank, malformed and uncracked lines are skipped.
    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_pot_line(line) {
            Ok((hash, plaintext)) => {
                self.entries.insert(hash, plaintext);
            }
            Err(PotError::MalformedLine(_)) => self.stats.malformed += 1,
            Err(PotError::EmptyPlaintext(_)) => self.stats.uncracked += 1,
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for line in lines {
            map.push_line(line.as_ref());
        }
        map.finish()
    }

    pub fn from_contents(contents: &str) -> Self {
        Self::from_lines(contents.lines())
    }

    /// Seal the map after the last line and report how many entries it holds.
    pub fn finish(mut self) -> Self {
        self.stats.loaded = self.entries.len();
        info!("loaded {} cracked hashes", self.entries.len());
        self
    }

    pub fn get(&self, hash: &str) -> Option<&str> {
        self.entries.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> PotStats {
        self.stats
    }
}
