//! Export helpers writing an [`Analysis`] to CSV files.
//!
//! The report path names a family of files that share its stem:
//!
//! - `<stem>_summary.csv`: headline counts and success rate
//! - `<stem>_passwords.csv`: every cracked password, most used first
//! - `<stem>_chart.csv`: the ten most used passwords, the series to chart
//! - `<stem>_patterns.csv`: character class composition
//! - `<stem>_words.csv`: the most common words
//! - `<stem>_lengths.csv`: length distribution, shortest first
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::Writer;
use serde::Serialize;

use crate::stats::{Analysis, TOP_CHART, TOP_WORDS, format_pct};

#[derive(Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Metric")]
    metric: &'a str,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
struct PasswordRow<'a> {
    #[serde(rename = "Password")]
    password: &'a str,
    #[serde(rename = "Number of Users")]
    users: u64,
    #[serde(rename = "Percentage of Cracked")]
    percentage: String,
}

#[derive(Serialize)]
struct PatternRow<'a> {
    #[serde(rename = "Character Type")]
    class: &'a str,
    #[serde(rename = "Count")]
    count: usize,
    #[serde(rename = "Percentage")]
    percentage: String,
}

#[derive(Serialize)]
struct WordRow<'a> {
    #[serde(rename = "Word")]
    word: &'a str,
    #[serde(rename = "Occurrences")]
    occurrences: u64,
    #[serde(rename = "% of Users")]
    percentage: String,
}

#[derive(Serialize)]
struct LengthRow {
    #[serde(rename = "Length")]
    length: usize,
    #[serde(rename = "Count")]
    count: u64,
    #[serde(rename = "Percentage")]
    percentage: String,
}

/// Paths of the files [`save_report`] writes for `report_path`.
pub fn report_paths<P: AsRef<Path>>(report_path: P) -> Result<[PathBuf; 6]> {
    let report_path = report_path.as_ref();
    let Some(stem) = report_path.file_stem().and_then(|s| s.to_str()) else {
        bail!("report path has no file name: {}", report_path.display());
    };
    let dir = report_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(["summary", "passwords", "chart", "patterns", "words", "lengths"]
        .map(|sheet| dir.join(format!("{}_{}.csv", stem, sheet))))
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut wtr = Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write {}", path.display()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_report<P: AsRef<Path>>(analysis: &Analysis, report_path: P) -> Result<Vec<PathBuf>> {
    let [summary, passwords, chart, patterns, words, lengths] = report_paths(report_path)?;

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut summary_rows = vec![
        SummaryRow {
            metric: "Total Users",
            value: analysis.total_users.to_string(),
        },
        SummaryRow {
            metric: "Unique Hashes",
            value: analysis.unique_hashes.to_string(),
        },
        SummaryRow {
            metric: "Cracked Hashes",
            value: analysis.matched_hashes.to_string(),
        },
        SummaryRow {
            metric: "Users with Cracked Passwords",
            value: analysis.users_cracked.to_string(),
        },
        SummaryRow {
            metric: "Not Cracked",
            value: (analysis.total_users - analysis.users_cracked).to_string(),
        },
        SummaryRow {
            metric: "Success Rate",
            value: format_pct(analysis.success_rate()),
        },
    ];
    if let Some(kw) = &analysis.keyword {
        summary_rows.push(SummaryRow {
            metric: "Keyword",
            value: kw.clone(),
        });
    }
    summary_rows.push(SummaryRow {
        metric: "Generated",
        value: generated,
    });
    write_rows(&summary, summary_rows)?;

    let password_rows = |n: usize| {
        analysis
            .top_passwords(n)
            .into_iter()
            .map(|(password, users)| PasswordRow {
                password,
                users,
                percentage: format_pct(analysis.share_of_cracked(users)),
            })
    };
    write_rows(&passwords, password_rows(analysis.passwords.len()))?;
    write_rows(&chart, password_rows(TOP_CHART))?;

    let comp = &analysis.composition;
    write_rows(
        &patterns,
        comp.classes().into_iter().map(|(class, count)| PatternRow {
            class,
            count,
            percentage: format_pct(comp.share(count)),
        }),
    )?;

    write_rows(
        &words,
        analysis
            .top_words(TOP_WORDS)
            .into_iter()
            .map(|(word, occurrences)| WordRow {
                word,
                occurrences,
                percentage: format_pct(analysis.share_of_cracked(occurrences)),
            }),
    )?;

    write_rows(
        &lengths,
        analysis.lengths.iter().map(|(length, count)| LengthRow {
            length: *length,
            count: *count,
            percentage: format_pct(analysis.share_of_cracked(*count)),
        }),
    )?;

    Ok(vec![summary, passwords, chart, patterns, words, lengths])
}
