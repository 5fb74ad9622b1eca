//! Formatting helpers for playground output.

use std::collections::BTreeSet;
use std::fmt::Write;

use kausal_discovery::SkeletonResult;

/// Render the kept edges and the separating sets of removed pairs.
pub fn format_result(result: &SkeletonResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Edges ({}):", result.graph.edge_count());
    for (a, b) in result.edges() {
        let _ = writeln!(output, "  {a} - {b}");
    }

    let removed = result.removed_edges();
    let _ = writeln!(output, "Removed ({}):", removed.len());
    for (a, b) in removed {
        let sets: Vec<String> = result
            .sepsets
            .get(a, b)
            .map(|sets| sets.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        let _ = writeln!(output, "  {a} - {b}  sepset {}", sets.join(" "));
    }

    let _ = writeln!(output, "{}", result.summary());
    output
}

/// Compare an estimated skeleton with the true one.
pub fn format_comparison(
    estimated: &BTreeSet<(usize, usize)>,
    truth: &BTreeSet<(usize, usize)>,
) -> String {
    let missing: Vec<_> = truth.difference(estimated).collect();
    let extra: Vec<_> = estimated.difference(truth).collect();
    format!(
        "true edges: {}, recovered: {}, missing: {:?}, extra: {:?}",
        truth.len(),
        truth.intersection(estimated).count(),
        missing,
        extra
    )
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(60));
}

/// Print a section header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {title}");
    println!("{}", "=".repeat(60));
}
