use std::io::Write;
use std::path::PathBuf;

use link_engine::content::{DirMapStore, MapSource, MapStoreError};
use link_engine::resolve_app_paths;
use link_engine::transition::{link_candidates, resolve_link};

#[derive(Debug, Clone, Default)]
pub struct CommonOptions {
    /// Falls back to `<root>/assets/maps` when unset.
    pub maps_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    List,
    Links,
    Resolve { gate_id: i64, map: String },
}

/// One gate whose id does not link to exactly one other map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateFinding {
    pub map: String,
    pub gate_key: String,
    pub gate_id: i64,
    pub partners: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub gates_checked: usize,
    pub unpaired: Vec<GateFinding>,
    pub ambiguous: Vec<GateFinding>,
}

impl LinkReport {
    pub fn is_clean(&self) -> bool {
        self.unpaired.is_empty() && self.ambiguous.is_empty()
    }
}

/// Checks every gate of every map for a single partner.
pub fn audit_links<S: MapSource + ?Sized>(store: &S) -> Result<LinkReport, MapStoreError> {
    let mut report = LinkReport::default();
    for file_name in store.list_available()? {
        let metadata = store.resolve(&file_name)?;
        for (gate_key, gate) in &metadata.gates {
            report.gates_checked += 1;
            let partners = link_candidates(store, gate.id, &metadata.name)?;
            let finding = GateFinding {
                map: metadata.name.clone(),
                gate_key: gate_key.clone(),
                gate_id: gate.id,
                partners,
            };
            match finding.partners.len() {
                0 => report.unpaired.push(finding),
                1 => {}
                _ => report.ambiguous.push(finding),
            }
        }
    }
    Ok(report)
}

pub fn run<W: Write>(kind: CommandKind, opts: CommonOptions, stdout: &mut W) -> Result<(), String> {
    let maps_dir = match opts.maps_dir {
        Some(path) => path,
        None => {
            resolve_app_paths()
                .map_err(|error| format!("failed to locate maps directory: {error}"))?
                .maps_dir
        }
    };
    if !maps_dir.is_dir() {
        return Err(format!(
            "maps directory does not exist: {}",
            maps_dir.display()
        ));
    }
    let store = DirMapStore::new(maps_dir);
    run_with_store(kind, &store, stdout)
}

pub fn run_with_store<S: MapSource + ?Sized, W: Write>(
    kind: CommandKind,
    store: &S,
    stdout: &mut W,
) -> Result<(), String> {
    match kind {
        CommandKind::List => list_maps(store, stdout),
        CommandKind::Links => {
            let report = audit_links(store).map_err(|error| error.to_string())?;
            write_report(&report, stdout)?;
            if report.is_clean() {
                Ok(())
            } else {
                Err(format!(
                    "{} unpaired and {} ambiguous gate(s)",
                    report.unpaired.len(),
                    report.ambiguous.len()
                ))
            }
        }
        CommandKind::Resolve { gate_id, map } => {
            let partner = resolve_link(store, gate_id, &map).map_err(|error| error.to_string())?;
            match partner {
                Some(partner) => emit(stdout, format_args!("{partner}")),
                None => Err(format!("gate {gate_id} on '{map}' has no partner map")),
            }
        }
    }
}

fn list_maps<S: MapSource + ?Sized, W: Write>(store: &S, stdout: &mut W) -> Result<(), String> {
    let files = store.list_available().map_err(|error| error.to_string())?;
    for file_name in files {
        let metadata = store
            .resolve(&file_name)
            .map_err(|error| error.to_string())?;
        let gate_ids = metadata
            .gates
            .values()
            .map(|gate| gate.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        emit(
            stdout,
            format_args!(
                "{} file:\"{file_name}\" gates:[{gate_ids}] npcs:{} obstacles:{}",
                metadata.name,
                metadata.npcs.len(),
                metadata.obstacles.len()
            ),
        )?;
    }
    Ok(())
}

fn write_report<W: Write>(report: &LinkReport, stdout: &mut W) -> Result<(), String> {
    for finding in &report.unpaired {
        emit(
            stdout,
            format_args!(
                "unpaired: {} \"{}\" id:{}",
                finding.map, finding.gate_key, finding.gate_id
            ),
        )?;
    }
    for finding in &report.ambiguous {
        emit(
            stdout,
            format_args!(
                "ambiguous: {} \"{}\" id:{} partners:[{}]",
                finding.map,
                finding.gate_key,
                finding.gate_id,
                finding.partners.join(",")
            ),
        )?;
    }
    emit(
        stdout,
        format_args!(
            "checked:{} unpaired:{} ambiguous:{}",
            report.gates_checked,
            report.unpaired.len(),
            report.ambiguous.len()
        ),
    )
}

fn emit<W: Write>(stdout: &mut W, line: std::fmt::Arguments<'_>) -> Result<(), String> {
    writeln!(stdout, "{line}").map_err(|error| format!("failed to write output: {error}"))
}
