use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use walkdir::WalkDir;
use xf_core::{MessageType, ValidationMessages, XFormError};
use xf_validator::{validate_xform_with_grammar, XFormGrammar};

#[derive(Debug, Parser)]
#[command(name = "xf-lint")]
#[command(about = "Structural validation for XForm documents")]
struct Cli {
    /// Files or directories to validate; directories are scanned
    /// recursively for .xml/.xhtml forms
    #[arg(required = true)]
    paths: Vec<String>,

    /// Emit the full report as one JSON document instead of line output
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: String,
    messages: ValidationMessages,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, XFormError> {
    let files = collect_form_files(&cli.paths)?;
    let grammar = XFormGrammar::default();

    let mut reports = Vec::new();
    for path in &files {
        let source = fs::read_to_string(path).map_err(|error| {
            XFormError::new(
                "LINT_SOURCE_READ",
                format!("{}: {}", path.display(), error),
            )
        })?;
        reports.push(FileReport {
            path: path.display().to_string(),
            messages: validate_xform_with_grammar(&source, &grammar),
        });
    }

    let has_errors = reports.iter().any(|report| report.messages.has_errors());

    if cli.json {
        let payload = serde_json::to_string(&reports)
            .map_err(|error| XFormError::new("LINT_REPORT_ENCODE", error.to_string()))?;
        println!("{}", payload);
    } else {
        emit_reports(&reports, has_errors);
    }

    Ok(if has_errors { 1 } else { 0 })
}

fn emit_reports(reports: &[FileReport], has_errors: bool) {
    for report in reports {
        println!("FILE:{}", report.path);
        for message in report.messages.iter() {
            let label = match message.r#type {
                MessageType::Error => "ERROR",
                MessageType::Warning => "WARNING",
            };
            println!(
                "{}_JSON:{}",
                label,
                serde_json::to_string(&message.text).unwrap_or_else(|_| "\"\"".to_string())
            );
        }
    }

    println!("RESULT:{}", if has_errors { "INVALID" } else { "OK" });
}

fn emit_error(error: XFormError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    2
}

fn collect_form_files(paths: &[String]) -> Result<Vec<PathBuf>, XFormError> {
    let mut files = Vec::new();

    for raw in paths {
        let path = Path::new(raw);
        if !path.exists() {
            return Err(XFormError::new(
                "LINT_SOURCE_NOT_FOUND",
                format!("Input path does not exist: {}", path.display()),
            ));
        }

        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.path().to_str() else {
                continue;
            };
            if name.ends_with(".xml") || name.ends_with(".xhtml") {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }

    if files.is_empty() {
        return Err(XFormError::new(
            "LINT_SOURCE_EMPTY",
            "No .xml/.xhtml forms found under the given paths.",
        ));
    }

    Ok(files)
}
