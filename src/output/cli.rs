use crate::model::{AuditReport, FindingGroup};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Suggestion")]
    suggestion: String,
}

pub fn print_table(report: &AuditReport) -> Result<()> {
    println!();
    println!(
        "Audit completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("Scanned {} modules.", report.modules.len());

    if report.findings.is_empty() {
        println!();
        println!("No issues found.");
        return Ok(());
    }

    println!();
    println!("Found {} issues:", report.findings.len());
    println!();

    let rows: Vec<FindingRow> = report
        .findings
        .iter()
        .map(|f| FindingRow {
            module: truncate(&f.module, 30),
            group: f.group.display_name().to_string(),
            message: truncate(&f.message, 70),
            suggestion: f
                .suggestion
                .as_deref()
                .map(|s| truncate(s, 45))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    print_summary(report);

    Ok(())
}

fn print_summary(report: &AuditReport) {
    println!("Summary:");
    println!("  Total findings: {}", report.findings.len());

    let breakdown: Vec<String> = FindingGroup::ALL
        .iter()
        .map(|group| (group, report.count_for_group(*group)))
        .filter(|(_, count)| *count > 0)
        .map(|(group, count)| format!("{} {}", count, group.display_name().to_lowercase()))
        .collect();
    if !breakdown.is_empty() {
        println!("  By group: {}", breakdown.join(", "));
    }

    let clean = report
        .modules
        .iter()
        .filter(|module| !report.findings.iter().any(|f| &f.module == *module))
        .count();
    println!("  Clean modules: {}/{}", clean, report.modules.len());
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
