use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use arogyam::pipeline::ReportAnalyzer;

const USAGE: &str = "usage: arogyam [REPORT_FILE | -] [male|female]\n\
                     Reads a lab report as text (stdin when no file or '-') and prints the analysis as JSON.";

fn read_report(source: Option<&str>) -> std::io::Result<String> {
    match source {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(Path::new(path)),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    arogyam::init_tracing();

    let source = args.first().map(String::as_str);
    let gender = args.get(1).map(String::as_str);

    let text = match read_report(source) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(source = source.unwrap_or("stdin"), error = %e, "Failed to read report");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let report = ReportAnalyzer::default().analyze_report(&text, gender);

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize analysis");
            return ExitCode::FAILURE;
        }
    }

    if report.is_error() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
