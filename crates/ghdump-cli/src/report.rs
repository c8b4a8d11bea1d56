use comfy_table::{Cell, Color, Table};
use console::style;
use ghdump_core::models::clone::{CloneResult, CloneStatus, DumpReport};

/// Build the per-repository results table.
pub fn table(report: &DumpReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["REPOSITORY", "RESULT", "TIME", "DETAIL"]);

    for result in &report.results {
        let (status, color) = match &result.status {
            CloneStatus::Exited(0) => ("cloned".to_string(), Color::Green),
            CloneStatus::Exited(code) => (format!("failed ({code})"), Color::Red),
            CloneStatus::Terminated => ("terminated".to_string(), Color::Red),
            CloneStatus::LaunchFailed(_) => ("not started".to_string(), Color::Red),
        };
        table.add_row(vec![
            Cell::new(&result.name),
            Cell::new(status).fg(color),
            Cell::new(elapsed(result)),
            Cell::new(detail(result)),
        ]);
    }

    table
}

fn elapsed(result: &CloneResult) -> String {
    let ms = (result.finished_at - result.started_at).num_milliseconds().max(0);
    format!("{:.1}s", ms as f64 / 1000.0)
}

fn detail(result: &CloneResult) -> String {
    match &result.status {
        CloneStatus::LaunchFailed(reason) => reason.clone(),
        CloneStatus::Exited(0) => String::new(),
        _ => result.stderr_tail.clone().unwrap_or_default(),
    }
}

/// One-line accounting of the run.
pub fn summary(report: &DumpReport) -> String {
    let ok = report.succeeded().count();
    let failed = report.failed().count();
    format!(
        "Dump complete: {ok} cloned | {failed} failed | {} total in {}",
        report.results.len(),
        report.destination.display()
    )
}

pub fn print(report: &DumpReport) {
    if report.results.is_empty() {
        println!("No repositories found; created empty {}", report.destination.display());
        return;
    }

    println!("{}", table(report));
    let line = summary(report);
    if report.has_failures() {
        println!("\n{}", style(line).red().bold());
        let names: Vec<_> = report.failed().map(|r| r.name.as_str()).collect();
        println!("Failed: {}", names.join(", "));
    } else {
        println!("\n{}", style(line).green());
    }
}
