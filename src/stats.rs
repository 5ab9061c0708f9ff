//! Password statistics over the join of a hash dump and a cracked-hash map.
//!
//! [`analyze`] matches every counted hash against the [`CrackMap`], folds the
//! occurrence counts into per-password totals and derives the composition,
//! word and length breakdowns from those totals. Rankings are stable: equal
//! counts keep the order in which passwords (or words) were first met.
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::dump::HashUsage;
use crate::pot::CrackMap;

/// Words listed in the report.
pub const TOP_WORDS: usize = 20;
/// Passwords and words echoed in the short summary.
pub const TOP_SUMMARY: usize = 5;
/// Passwords charted in the report.
pub const TOP_CHART: usize = 10;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3,}").expect("word pattern compiles"));

/// Raised instead of computing statistics that would divide by zero.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoResults {
    #[error("the hash dump contained no usable hashes")]
    EmptyDump,
    #[error("no passwords were matched ({total_users} users, {unique_hashes} unique hashes)")]
    NoMatches {
        total_users: u64,
        unique_hashes: usize,
    },
}

/// `n / d` as a percentage, or `None` when `d` is zero.
pub fn percentage(n: u64, d: u64) -> Option<f64> {
    if d == 0 {
        return None;
    }
    Some((n as f64) / (d as f64) * 100.0)
}

pub fn format_pct(p: Option<f64>) -> String {
    match p {
        Some(v) => format!("{:.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Character classes present across the unique password set. A password
/// counts once in every class it touches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub unique_passwords: usize,
    pub uppercase: usize,
    pub lowercase: usize,
    pub digit: usize,
    pub special: usize,
}

impl Composition {
    pub fn of<'a, I>(passwords: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = Self::default();
        for pw in passwords {
            out.unique_passwords += 1;
            if pw.chars().any(char::is_uppercase) {
                out.uppercase += 1;
            }
            if pw.chars().any(char::is_lowercase) {
                out.lowercase += 1;
            }
            if pw.chars().any(|c| c.is_ascii_digit()) {
                out.digit += 1;
            }
            if pw.chars().any(|c| !c.is_alphanumeric()) {
                out.special += 1;
            }
        }
        out
    }

    /// Share of unique passwords, `None` for an empty set.
    pub fn share(&self, count: usize) -> Option<f64> {
        percentage(count as u64, self.unique_passwords as u64)
    }

    /// `(label, count)` pairs in display order.
    pub fn classes(&self) -> [(&'static str, usize); 4] {
        [
            ("Uppercase", self.uppercase),
            ("Lowercase", self.lowercase),
            ("Numbers", self.digit),
            ("Special", self.special),
        ]
    }
}

/// Sum the usage of every cracked hash under its plaintext. Returns the
/// per-password totals and the number of distinct hashes that matched.
pub fn join(crack_map: &CrackMap, usage: &HashUsage) -> (IndexMap<String, u64>, usize) {
    let mut passwords: IndexMap<String, u64> = IndexMap::new();
    let mut matched = 0;
    for (hash, count) in usage.iter() {
        if let Some(pw) = crack_map.get(hash) {
            matched += 1;
            *passwords.entry(pw.to_string()).or_insert(0) += count;
        }
    }
    (passwords, matched)
}

/// The `n` largest counts, descending; ties keep map order.
pub fn ranked(counts: &IndexMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut items: Vec<(&str, u64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    items.sort_by_key(|&(_, count)| Reverse(count));
    items.truncate(n);
    items
}

/// Total usage of passwords containing `keyword`, ignoring case.
pub fn keyword_count(passwords: &IndexMap<String, u64>, keyword: &str) -> u64 {
    let needle = keyword.to_lowercase();
    passwords
        .iter()
        .filter(|(pw, _)| pw.to_lowercase().contains(&needle))
        .map(|(_, count)| *count)
        .sum()
}

/// Lowercased runs of 3+ ASCII letters, weighted by password usage. When a
/// keyword is given its entry is replaced by [`keyword_count`].
pub fn word_frequency(
    passwords: &IndexMap<String, u64>,
    keyword: Option<&str>,
) -> IndexMap<String, u64> {
    let mut words: IndexMap<String, u64> = IndexMap::new();
    for (pw, count) in passwords {
        for m in WORD_RE.find_iter(pw) {
            *words.entry(m.as_str().to_lowercase()).or_insert(0) += count;
        }
    }
    if let Some(kw) = keyword {
        words.insert(kw.to_lowercase(), keyword_count(passwords, kw));
    }
    words
}

/// Usage per password length in characters.
pub fn length_distribution(passwords: &IndexMap<String, u64>) -> BTreeMap<usize, u64> {
    let mut lengths: BTreeMap<usize, u64> = BTreeMap::new();
    for (pw, count) in passwords {
        *lengths.entry(pw.chars().count()).or_insert(0) += count;
    }
    lengths
}

/// Everything the reporting layer needs from one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub total_users: u64,
    pub unique_hashes: usize,
    pub matched_hashes: usize,
    pub users_cracked: u64,
    pub passwords: IndexMap<String, u64>,
    pub composition: Composition,
    pub words: IndexMap<String, u64>,
    pub lengths: BTreeMap<usize, u64>,
    pub keyword: Option<String>,
}

impl Analysis {
    pub fn top_passwords(&self, n: usize) -> Vec<(&str, u64)> {
        ranked(&self.passwords, n)
    }

    pub fn top_words(&self, n: usize) -> Vec<(&str, u64)> {
        ranked(&self.words, n)
    }

    /// Users with a cracked password over all counted users.
    pub fn success_rate(&self) -> Option<f64> {
        percentage(self.users_cracked, self.total_users)
    }

    pub fn share_of_cracked(&self, count: u64) -> Option<f64> {
        percentage(count, self.users_cracked)
    }

    pub fn keyword_count(&self) -> Option<u64> {
        let kw = self.keyword.as_deref()?;
        self.words.get(&kw.to_lowercase()).copied()
    }
}

/// Join `usage` against `crack_map` and derive every statistic.
///
/// A blank `keyword` disables keyword tracking.
pub fn analyze(
    crack_map: &CrackMap,
    usage: &HashUsage,
    keyword: Option<&str>,
) -> Result<Analysis, NoResults> {
    if usage.is_empty() {
        warn!("no hashes were counted in the dump");
        return Err(NoResults::EmptyDump);
    }
    let total_users = usage.total();
    let unique_hashes = usage.unique();
    let (passwords, matched_hashes) = join(crack_map, usage);
    let users_cracked: u64 = passwords.values().sum();
    info!(
        "unique hashes: {}, users: {}, matched hashes: {}, users with cracked passwords: {}",
        unique_hashes, total_users, matched_hashes, users_cracked
    );
    if passwords.is_empty() {
        warn!("no passwords were successfully matched");
        return Err(NoResults::NoMatches {
            total_users,
            unique_hashes,
        });
    }

    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
    let composition = Composition::of(passwords.keys().map(String::as_str));
    let words = word_frequency(&passwords, keyword);
    let lengths = length_distribution(&passwords);

    Ok(Analysis {
        total_users,
        unique_hashes,
        matched_hashes,
        users_cracked,
        passwords,
        composition,
        words,
        lengths,
        keyword: keyword.map(str::to_string),
    })
}
