//! desk-runner: headless runner for the fraud desk.
//!
//! Usage:
//!   desk-runner --db desk.db check 021000021 5678
//!   desk-runner --db desk.db search "Jane Smith"
//!   desk-runner --db desk.db import reports.csv --company "Apex Funding" --approve
//!   desk-runner --db desk.db uploads
//!   desk-runner --db desk.db approve <upload-id>
//!   desk-runner --db desk.db reject <upload-id>
//!   desk-runner --db desk.db --ipc-mode

use anyhow::Result;
use frauddesk_core::{
    api::{FraudCheckResponse, SubmitFraudRequest, SubmitFraudResponse},
    config::DeskConfig,
    engine::FraudDesk,
    normalize::ColumnMapping,
    store::Store,
};
use log::warn;
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    FraudCheck {
        routing_number: String,
        account_number_last4: String,
    },
    SubmitFraud(SubmitFraudRequest),
    SearchHolder {
        query: String,
    },
    UploadBatch {
        company_name: String,
        file_name: String,
        rows: Vec<HashMap<String, String>>,
    },
    ListUploads,
    ApproveUpload {
        upload_id: String,
        approved_by: String,
    },
    RejectUpload {
        upload_id: String,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let store = Store::open(db)?;
    store.migrate()?;
    let config = DeskConfig::load(data_dir)?;
    let mut desk = FraudDesk::new(store, config, seed);

    if ipc_mode {
        return run_ipc_loop(&mut desk);
    }

    let positional = positionals(&args);
    match positional.first().map(String::as_str) {
        Some("check") => {
            let (routing, last4) = two_args(&positional, "check ROUTING LAST4")?;
            let check = desk.check_account(routing, last4)?;
            print_json(&FraudCheckResponse::from(&check))?;
        }
        Some("search") => {
            let query = positional
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("Usage: search QUERY"))?;
            match desk.search_holder(query)? {
                Some(check) => print_json(&FraudCheckResponse::from(&check))?,
                None => println!("No matching account holder."),
            }
        }
        Some("import") => {
            let path = positional
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("Usage: import FILE --company NAME [--approve]"))?;
            let company = arg_value(&args, "--company").unwrap_or("Unknown");
            let (headers, rows) = read_csv_rows(path)?;
            // Detect from the file's ordered header row unless the user
            // supplied an explicit mapping.
            let mapping = match load_mapping(&args)? {
                Some(m) => m,
                None => ColumnMapping::detect(&headers),
            };
            let upload = desk.upload_batch(company, path, Some(mapping), &rows)?;
            println!(
                "Queued upload {} ({} row(s)) from '{}'",
                upload.upload_id, upload.record_count, company
            );
            if args.iter().any(|a| a == "--approve") {
                let summary = desk.approve_upload(&upload.upload_id, "desk-runner")?;
                println!(
                    "Approved: {} imported, {} associated, {} skipped",
                    summary.imported, summary.associated, summary.skipped
                );
            }
        }
        Some("uploads") => {
            for upload in desk.uploads()? {
                println!(
                    "{}  {}  {}  {} row(s)  [{}]",
                    upload.upload_id,
                    upload.upload_date,
                    upload.company_name,
                    upload.record_count,
                    upload.status
                );
            }
        }
        Some("approve") => {
            let id = positional
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("Usage: approve UPLOAD_ID"))?;
            let summary = desk.approve_upload(id, "desk-runner")?;
            println!(
                "Approved: {} imported, {} associated, {} skipped",
                summary.imported, summary.associated, summary.skipped
            );
        }
        Some("reject") => {
            let id = positional
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("Usage: reject UPLOAD_ID"))?;
            desk.reject_upload(id)?;
            println!("Rejected upload {id}");
        }
        _ => {
            println!("shared fraud database — desk-runner");
            println!("  subcommands: check, search, import, uploads, approve, reject");
            println!("  flags:       --db PATH --data-dir DIR --seed N --ipc-mode");
        }
    }

    Ok(())
}

fn run_ipc_loop(desk: &mut FraudDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        let response = match handle_ipc(desk, cmd) {
            Ok(None) => break, // Quit
            Ok(Some(json)) => json,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_ipc(desk: &mut FraudDesk, cmd: IpcCommand) -> Result<Option<serde_json::Value>> {
    let response = match cmd {
        IpcCommand::Quit => return Ok(None),
        IpcCommand::FraudCheck {
            routing_number,
            account_number_last4,
        } => {
            let check = desk.check_account(&routing_number, &account_number_last4)?;
            serde_json::to_value(FraudCheckResponse::from(&check))?
        }
        IpcCommand::SubmitFraud(request) => {
            let submission_id = desk.submit_report(request.into_report()?)?;
            serde_json::to_value(SubmitFraudResponse::accepted(submission_id))?
        }
        IpcCommand::SearchHolder { query } => match desk.search_holder(&query)? {
            Some(check) => serde_json::to_value(FraudCheckResponse::from(&check))?,
            None => serde_json::json!({ "match": null }),
        },
        IpcCommand::UploadBatch {
            company_name,
            file_name,
            rows,
        } => {
            let upload = desk.upload_batch(&company_name, &file_name, None, &rows)?;
            serde_json::to_value(&upload)?
        }
        IpcCommand::ListUploads => serde_json::to_value(desk.uploads()?)?,
        IpcCommand::ApproveUpload {
            upload_id,
            approved_by,
        } => {
            let summary = desk.approve_upload(&upload_id, &approved_by)?;
            serde_json::to_value(summary)?
        }
        IpcCommand::RejectUpload { upload_id } => {
            desk.reject_upload(&upload_id)?;
            serde_json::json!({ "status": "rejected", "upload_id": upload_id })
        }
    };
    Ok(Some(response))
}

/// Read a CSV file into its ordered header row plus string-keyed rows.
/// Unparseable records are logged and skipped; the core drops malformed
/// rows on its own terms.
fn read_csv_rows(path: &str) -> Result<(Vec<String>, Vec<HashMap<String, String>>)> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let row: HashMap<String, String> = headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect();
                rows.push(row);
            }
            Err(e) => warn!("Skipping unparseable CSV record: {e}"),
        }
    }
    Ok((headers, rows))
}

/// Optional explicit column mapping from a JSON file (--mapping PATH).
fn load_mapping(args: &[String]) -> Result<Option<ColumnMapping>> {
    match arg_value(args, "--mapping") {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
            Ok(Some(serde_json::from_str(&content)?))
        }
        None => Ok(None),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

/// Everything that is not a flag or a flag's value, past argv[0].
fn positionals(args: &[String]) -> Vec<String> {
    const VALUE_FLAGS: [&str; 5] = ["--db", "--data-dir", "--seed", "--company", "--mapping"];
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if VALUE_FLAGS.contains(&arg.as_str()) {
            i += 2;
            continue;
        }
        if arg.starts_with("--") {
            i += 1;
            continue;
        }
        out.push(arg.clone());
        i += 1;
    }
    out
}

fn two_args<'a>(positional: &'a [String], usage: &str) -> Result<(&'a str, &'a str)> {
    match (positional.get(1), positional.get(2)) {
        (Some(a), Some(b)) => Ok((a.as_str(), b.as_str())),
        _ => Err(anyhow::anyhow!("Usage: {usage}")),
    }
}
