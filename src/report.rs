//! Human-readable report rendering for terminal output.
//!
//! Produces a colored summary: overall counts and success rate, the most used
//! passwords, character class composition, common words and the length
//! distribution.
use colored::*;

use crate::stats::{Analysis, NoResults, TOP_SUMMARY, format_pct};

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

fn push_section(out: &mut String, title: &str, lines: Vec<String>) {
    out.push_str(&section_header(title));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

pub fn render_summary(analysis: &Analysis) -> String {
    render_summary_with_top(analysis, TOP_SUMMARY)
}

pub fn render_summary_with_top(analysis: &Analysis, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "Password Analysis Complete!".bold().cyan()
    ));

    let summary_lines = vec![
        format!("Total Users: {}", analysis.total_users),
        format!("Unique Hashes: {}", analysis.unique_hashes),
        format!("Cracked Passwords (Unique): {}", analysis.matched_hashes),
        format!("Users with Cracked Passwords: {}", analysis.users_cracked),
        format!(
            "Success Rate: {}",
            format_pct(analysis.success_rate()).green()
        ),
    ];
    push_section(
        &mut out,
        &"Password Analysis Summary".bold().yellow().to_string(),
        summary_lines,
    );

    let mut top_lines: Vec<String> = Vec::new();
    for (pw, count) in analysis.top_passwords(top_n) {
        top_lines.push(format!(
            "  '{}': {} users ({})",
            pw.red(),
            count,
            format_pct(analysis.share_of_cracked(count))
        ));
    }
    push_section(
        &mut out,
        &format!("Top {} Most Used Passwords", top_n)
            .bold()
            .magenta()
            .to_string(),
        top_lines,
    );

    let comp = &analysis.composition;
    let mut comp_lines: Vec<String> = vec![format!("Unique Passwords: {}", comp.unique_passwords)];
    for (label, count) in comp.classes() {
        comp_lines.push(format!(
            "  Contains {}: {} ({})",
            label,
            count,
            format_pct(comp.share(count))
        ));
    }
    push_section(
        &mut out,
        &"Character Type Analysis".bold().cyan().to_string(),
        comp_lines,
    );

    let mut word_lines: Vec<String> = Vec::new();
    let top_words = analysis.top_words(TOP_SUMMARY);
    if top_words.is_empty() {
        word_lines.push("(No words found)".to_string());
    }
    for (word, count) in top_words {
        let is_keyword = analysis
            .keyword
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case(word));
        let word = if is_keyword {
            word.bold().yellow().to_string()
        } else {
            word.to_string()
        };
        word_lines.push(format!(
            "  '{}': {} occurrences ({})",
            word,
            count,
            format_pct(analysis.share_of_cracked(count))
        ));
    }
    push_section(
        &mut out,
        &format!("Top {} Common Words in Passwords", TOP_SUMMARY)
            .bold()
            .cyan()
            .to_string(),
        word_lines,
    );

    let mut length_lines: Vec<String> = Vec::new();
    for (len, count) in &analysis.lengths {
        length_lines.push(format!(
            "  {:>3}: {} ({})",
            len,
            count,
            format_pct(analysis.share_of_cracked(*count))
        ));
    }
    push_section(
        &mut out,
        &"Password Length Distribution".bold().cyan().to_string(),
        length_lines,
    );

    out
}

/// Short notice for runs that produced nothing to report.
pub fn render_no_results(no_results: &NoResults) -> String {
    let mut out = String::new();
    if let NoResults::NoMatches {
        total_users,
        unique_hashes,
    } = no_results
    {
        out.push_str(&format!("Total unique NTLM hashes: {}\n", unique_hashes));
        out.push_str(&format!("Total users: {}\n", total_users));
    }
    out.push_str(&format!(
        "{}\n",
        "No passwords were successfully matched!".bold().red()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    const DUMP: &str = "DOM\\A:1:aad3b435b51404eeaad3b435b51404ee:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:::\n\
                        DOM\\B:2:aad3b435b51404eeaad3b435b51404ee:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:::\n\
                        DOM\\C:3:aad3b435b51404eeaad3b435b51404ee:cccccccccccccccccccccccccccccccc:::\n\
                        DOM\\D:4:aad3b435b51404eeaad3b435b51404ee:dddddddddddddddddddddddddddddddd:::";
    const POT: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:Acme2024!\ncccccccccccccccccccccccccccccccc:winter";

    fn analysis() -> Analysis {
        let mut e = Engine::new();
        e.load_from_strings(&[DUMP], &[POT]);
        e.analyze(Some("Acme")).unwrap()
    }

    #[test]
    fn snapshot_summary() {
        colored::control::set_override(false);
        let s = render_summary(&analysis());
        insta::assert_snapshot!(s, @r"
Password Analysis Complete!

Password Analysis Summary
─────────────────────────

Total Users: 4
Unique Hashes: 3
Cracked Passwords (Unique): 2
Users with Cracked Passwords: 3
Success Rate: 75.0%

Top 5 Most Used Passwords
─────────────────────────

  'Acme2024!': 2 users (66.7%)
  'winter': 1 users (33.3%)

Character Type Analysis
───────────────────────

Unique Passwords: 2
  Contains Uppercase: 1 (50.0%)
  Contains Lowercase: 2 (100.0%)
  Contains Numbers: 1 (50.0%)
  Contains Special: 1 (50.0%)

Top 5 Common Words in Passwords
───────────────────────────────

  'acme': 2 occurrences (66.7%)
  'winter': 1 occurrences (33.3%)

Password Length Distribution
────────────────────────────

    6: 1 (33.3%)
    9: 2 (66.7%)
");
    }

    #[test]
    fn top_respects_limit() {
        colored::control::set_override(false);
        let s = render_summary_with_top(&analysis(), 1);
        assert!(s.contains("Top 1 Most Used Passwords"));
        assert!(s.contains("'Acme2024!': 2 users"));
        assert!(!s.contains("'winter': 1 users"));
    }

    #[test]
    fn no_results_lists_counts() {
        colored::control::set_override(false);
        let s = render_no_results(&NoResults::NoMatches {
            total_users: 4,
            unique_hashes: 3,
        });
        assert!(s.contains("Total users: 4"));
        assert!(s.contains("Total unique NTLM hashes: 3"));
        assert!(s.contains("No passwords were successfully matched!"));
        assert!(!render_no_results(&NoResults::EmptyDump).contains("Total users"));
    }
}
