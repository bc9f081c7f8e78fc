//! pdfsorter CLI: group PDFs by topic and archive them.
//!
//! Labels every PDF in a folder with a local language model, merges
//! near-duplicate labels, and writes a zip with one folder per topic.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Report;
use pdfsorter_shared::PdfSorterError;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(exit_code(&report))
        }
    }
}

/// 2 for model failures, 1 for everything else.
fn exit_code(report: &Report) -> u8 {
    report
        .downcast_ref::<PdfSorterError>()
        .map(PdfSorterError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    use color_eyre::eyre::eyre;

    #[test]
    fn exit_code_follows_error_kind() {
        let model: Report = PdfSorterError::Completion("timeout".into()).into();
        assert_eq!(exit_code(&model), 2);

        let config: Report = PdfSorterError::config("no folder").into();
        assert_eq!(exit_code(&config), 1);

        assert_eq!(exit_code(&eyre!("interrupted")), 1);
    }
}
