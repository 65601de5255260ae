use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use maplink_cli::{run, CommandKind, CommonOptions};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--maps-dir" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --maps-dir".to_string())?;
                options.maps_dir = Some(PathBuf::from(value));
                index += 2;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "list" => {
            if !command_args.is_empty() {
                return Err("list takes no arguments".to_string());
            }
            CommandKind::List
        }
        "links" => {
            if !command_args.is_empty() {
                return Err("links takes no arguments".to_string());
            }
            CommandKind::Links
        }
        "resolve" => {
            let [gate_id, map @ ..] = command_args else {
                return Err("resolve requires a gate id and a map".to_string());
            };
            if map.is_empty() {
                return Err("resolve requires a map after the gate id".to_string());
            }
            let gate_id = gate_id
                .parse::<i64>()
                .map_err(|_| format!("invalid gate id '{gate_id}' (expected integer)"))?;
            // Map names may contain spaces ("route 201") and arrive unquoted.
            CommandKind::Resolve {
                gate_id,
                map: map.join(" "),
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    run(kind, options, &mut io::stdout())
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "maplink_cli - map metadata and gate link audit",
        "",
        "Usage:",
        "  maplink_cli [--maps-dir <path>] list",
        "  maplink_cli [--maps-dir <path>] links",
        "  maplink_cli [--maps-dir <path>] resolve <gate-id> <map...>",
        "",
        "Defaults:",
        "  --maps-dir <root>/assets/maps",
        "  <root> is LINKGE_ROOT, else found by walking up from the executable",
    ]
    .join("\n")
}
