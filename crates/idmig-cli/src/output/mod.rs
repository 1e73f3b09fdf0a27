use crate::cli::{GlobalFlags, OutputFormat};

mod report;
mod text;

pub use report::RunReport;

/// Render the report in the requested format.
pub fn render(report: &RunReport, flags: &GlobalFlags) -> anyhow::Result<String> {
    match flags.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(text::render(report, flags.verbose)?),
    }
}

/// Print the report to stdout.
pub fn output(report: &RunReport, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rendered = render(report, flags)?;
    println!("{rendered}");
    Ok(())
}
