//! Engine: loads the hash dump and cracked-hash inputs, keeps the resulting
//! [`HashUsage`] and [`CrackMap`], and runs the statistics over them.
//! File loaders stream lines with optional memory-mapped I/O.
//!
//! Typical usage:
//!
//! ```no_run
//! use crackstats::engine::Engine;
//! # fn main() -> anyhow::Result<()> {
//! let mut engine = Engine::new();
//! engine.load_from_file_paths(&["/path/to/ntds.txt"], &["/path/to/cracked.txt"])?;
//! match engine.analyze(Some("acme")) {
//!     Ok(analysis) => println!("{}", crackstats::report::render_summary(&analysis)),
//!     Err(no_results) => eprintln!("{no_results}"),
//! }
//! # Ok(())
//! # }
//! ```
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::dump::{DumpStats, HashUsage, HashUsageParser};
use crate::io::{DEFAULT_MMAP_THRESHOLD_BYTES, iter_lines_auto};
use crate::pot::{CrackMap, PotStats};
use crate::stats::{Analysis, NoResults, analyze};

/// How the inputs of the last load were consumed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub dump: DumpStats,
    pub pot: PotStats,
}

#[derive(Debug, Default)]
pub struct Engine {
    pub usage: HashUsage,
    pub crack_map: CrackMap,
    pub parse_stats: Option<ParseStats>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load inputs already in memory. Intended for tests and small
    /// programmatic integrations.
    pub fn load_from_strings(&mut self, dumps: &[&str], pots: &[&str]) {
        let mut parser = HashUsageParser::new();
        for d in dumps {
            for line in d.lines() {
                parser.push_line(line);
            }
        }
        let mut crack_map = CrackMap::new();
        for p in pots {
            for line in p.lines() {
                crack_map.push_line(line);
            }
        }
        self.install(parser, crack_map.finish());
    }

    /// Stream the given files line by line, memory-mapping those at or above
    /// `mmap_threshold_bytes`.
    pub fn load_from_file_paths_with_threshold<P: AsRef<Path>>(
        &mut self,
        dump_paths: &[P],
        pot_paths: &[P],
        mmap_threshold_bytes: u64,
    ) -> Result<()> {
        let parser = load_dumps(dump_paths, mmap_threshold_bytes)?;
        let crack_map = load_pots(pot_paths, mmap_threshold_bytes)?;
        self.install(parser, crack_map);
        Ok(())
    }

    /// Same as [`Engine::load_from_file_paths_with_threshold`] but reads the
    /// dump and the cracked-hash files on separate rayon workers.
    pub fn load_from_file_paths_parallel_with_threshold<P: AsRef<Path> + Sync>(
        &mut self,
        dump_paths: &[P],
        pot_paths: &[P],
        mmap_threshold_bytes: u64,
    ) -> Result<()> {
        let (parser, crack_map) = rayon::join(
            || load_dumps(dump_paths, mmap_threshold_bytes),
            || load_pots(pot_paths, mmap_threshold_bytes),
        );
        self.install(parser?, crack_map?);
        Ok(())
    }

    /// Convenience wrapper that uses the default mmap threshold.
    pub fn load_from_file_paths<P: AsRef<Path>>(
        &mut self,
        dump_paths: &[P],
        pot_paths: &[P],
    ) -> Result<()> {
        self.load_from_file_paths_with_threshold(dump_paths, pot_paths, DEFAULT_MMAP_THRESHOLD_BYTES)
    }

    pub fn analyze(&self, keyword: Option<&str>) -> Result<Analysis, NoResults> {
        analyze(&self.crack_map, &self.usage, keyword)
    }

    fn install(&mut self, parser: HashUsageParser, crack_map: CrackMap) {
        for (i, line) in parser.preview().iter().enumerate() {
            debug!("dump line {}: {}", i + 1, line);
        }
        for format in parser.detected_formats() {
            info!("dump format present: {}", format.describe());
        }
        let (usage, dump) = parser.finish();
        self.parse_stats = Some(ParseStats {
            dump,
            pot: crack_map.stats(),
        });
        self.usage = usage;
        self.crack_map = crack_map;
    }
}

fn load_dumps<P: AsRef<Path>>(paths: &[P], mmap_threshold_bytes: u64) -> Result<HashUsageParser> {
    let mut parser = HashUsageParser::new();
    for p in paths {
        let p = p.as_ref();
        for line in iter_lines_auto(p, mmap_threshold_bytes)? {
            let line = line.with_context(|| format!("read {}", p.display()))?;
            parser.push_line(&line);
        }
    }
    Ok(parser)
}

fn load_pots<P: AsRef<Path>>(paths: &[P], mmap_threshold_bytes: u64) -> Result<CrackMap> {
    let mut crack_map = CrackMap::new();
    for p in paths {
        let p = p.as_ref();
        for line in iter_lines_auto(p, mmap_threshold_bytes)? {
            let line = line.with_context(|| format!("read {}", p.display()))?;
            crack_map.push_line(&line);
        }
    }
    Ok(crack_map.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DUMP: &str = "DOM\\Admin:500:aad3b435b51404eeaad3b435b51404ee:8846f7eaee8fb117ad06bdd830b7586c:::\n\
                        DOM\\Guest:501:aad3b435b51404eeaad3b435b51404ee:31d6cfe0d16ae931b73c59d7e0c089c0:::\n\
                        DOM\\User:1001:aad3b435b51404eeaad3b435b51404ee:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb:::\n\
                        DOM\\Other:1002:aad3b435b51404eeaad3b435b51404ee:8846F7EAEE8FB117AD06BDD830B7586C:::";
    const POT: &str = "8846f7eaee8fb117ad06bdd830b7586c:password\nbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb:";

    #[test]
    fn loads_strings_and_records_parse_stats() {
        let mut e = Engine::new();
        e.load_from_strings(&[DUMP], &[POT]);
        assert_eq!(e.usage.total(), 3);
        assert_eq!(e.usage.unique(), 2);
        assert_eq!(e.crack_map.len(), 1);
        let stats = e.parse_stats.unwrap();
        assert_eq!(stats.dump.placeholders, 1);
        assert_eq!(stats.pot.uncracked, 1);

        let a = e.analyze(None).unwrap();
        assert_eq!(a.users_cracked, 2);
        assert_eq!(a.total_users, 3);
        assert!(a.users_cracked <= a.total_users);
    }

    #[test]
    fn file_loaders_agree_with_string_loader() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("ntds.txt");
        let pot = dir.path().join("cracked.txt");
        fs::write(&dump, DUMP).unwrap();
        fs::write(&pot, POT).unwrap();

        let mut from_strings = Engine::new();
        from_strings.load_from_strings(&[DUMP], &[POT]);
        let expected = from_strings.analyze(Some("pass")).unwrap();

        for threshold in [1, DEFAULT_MMAP_THRESHOLD_BYTES] {
            let mut e = Engine::new();
            e.load_from_file_paths_with_threshold(&[&dump], &[&pot], threshold)
                .unwrap();
            assert_eq!(e.analyze(Some("pass")).unwrap(), expected);

            let mut p = Engine::new();
            p.load_from_file_paths_parallel_with_threshold(&[&dump], &[&pot], threshold)
                .unwrap();
            assert_eq!(p.analyze(Some("pass")).unwrap(), expected);
            assert_eq!(p.parse_stats, from_strings.parse_stats);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut e = Engine::new();
        let missing = dir.path().join("nope.txt");
        assert!(e.load_from_file_paths(&[&missing], &[&missing]).is_err());
        assert!(e.parse_stats.is_none());
    }
}
