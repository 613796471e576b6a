//! save-tool: headless utility for Sugarspin save databases.
//!
//! Usage:
//!   save-tool inspect --file save.txt
//!   save-tool inspect --envelope "V29:1700000000000:eyJ..."
//!   save-tool export  --db save.db --out save.txt
//!   save-tool import  --db save.db --file save.txt
//!   save-tool slots   --db save.db
//!   save-tool sync    --db save.db --device <stable-device-id>

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use sugarspin_core::{
    codec, compat,
    config::EngineConfig,
    mode::ModeSnapshot,
    persistence::{now_ms, LoadOutcome, SaveManager},
    state::GameState,
    store::SaveStore,
    sync::{SqliteBackend, SyncManager},
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "inspect" => inspect(&args),
        "export" => export(&args),
        "import" => import(&args),
        "slots" => slots(&args),
        "sync" => sync(&args),
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("save-tool — Sugarspin save inspector");
    println!("  inspect --file <path> | --envelope <string>");
    println!("  export  --db <path> [--out <path>]");
    println!("  import  --db <path> --file <path>");
    println!("  slots   --db <path>");
    println!("  sync    --db <path> [--device <id>]");
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn open_manager(args: &[String]) -> Result<SaveManager> {
    let db = arg_value(args, "--db").context("--db is required")?;
    let store = SaveStore::open(db)?;
    store.migrate()?;
    Ok(SaveManager::new(store, EngineConfig::default()))
}

fn read_envelope_arg(args: &[String]) -> Result<String> {
    if let Some(envelope) = arg_value(args, "--envelope") {
        return Ok(envelope.trim().to_string());
    }
    if let Some(path) = arg_value(args, "--file") {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        return Ok(text.trim().to_string());
    }
    bail!("expected --envelope or --file");
}

fn inspect(args: &[String]) -> Result<()> {
    let raw = read_envelope_arg(args)?;
    let envelope = codec::decode(&raw)?;
    let report = compat::analyze_against_current(envelope.version, &envelope.document);

    println!("version:    {}", envelope.version);
    println!("timestamp:  {}", envelope.timestamp_ms);
    println!("checksum:   {:#010X}", codec::envelope_checksum(&raw)?);
    println!("fields:     {}", envelope.document.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn export(args: &[String]) -> Result<()> {
    let manager = open_manager(args)?;
    let Some(envelope) = manager.export_envelope()? else {
        bail!("no local save in this database");
    };
    match arg_value(args, "--out") {
        Some(path) => {
            fs::write(path, &envelope).with_context(|| format!("writing {path}"))?;
            println!("exported to {path}");
        }
        None => println!("{envelope}"),
    }
    Ok(())
}

fn import(args: &[String]) -> Result<()> {
    let manager = open_manager(args)?;
    let raw = read_envelope_arg(args)?;

    match manager.import_envelope(&raw)? {
        LoadOutcome::Loaded { state, .. } => {
            persist_imported(&manager, &state)?;
            println!("imported (same version)");
        }
        LoadOutcome::Migrated { state, notice, .. } => {
            persist_imported(&manager, &state)?;
            println!("imported: {}", notice.message());
        }
        LoadOutcome::NeedsDecision { envelope, notice, .. } => {
            println!("{}", notice.message());
            if args.iter().any(|a| a == "--force") {
                let (state, notice) = manager.force_load(&envelope)?;
                persist_imported(&manager, &state)?;
                println!("forced: {}", notice.message());
            } else {
                println!("re-run with --force to proceed");
            }
        }
        LoadOutcome::Refused { notice, .. } => bail!("{}", notice.message()),
        LoadOutcome::Corrupt { notice } | LoadOutcome::MigrationFailed { notice } => {
            bail!("{}", notice.message())
        }
        LoadOutcome::Empty => unreachable!("import always has an envelope"),
    }
    Ok(())
}

fn persist_imported(manager: &SaveManager, state: &GameState) -> Result<()> {
    manager.save(state, &ModeSnapshot::inactive(), true)?;
    log::info!("imported save persisted under the local storage key");
    Ok(())
}

fn slots(args: &[String]) -> Result<()> {
    let db = arg_value(args, "--db").context("--db is required")?;
    let store = SaveStore::open(db)?;
    store.migrate()?;

    let rows = store.list_slots()?;
    if rows.is_empty() {
        println!("no cloud slots");
        return Ok(());
    }
    for row in rows {
        let kind = if row.is_auto { "auto" } else { "manual" };
        let when = chrono::DateTime::from_timestamp_millis(row.last_modified_ms as i64)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| row.last_modified_ms.to_string());
        println!(
            "{:<24} {:<6} {:>8}B  {}  device={}  \"{}\"",
            row.slot_id, kind, row.size_bytes, when, row.device_id, row.name
        );
    }
    Ok(())
}

fn sync(args: &[String]) -> Result<()> {
    let db = arg_value(args, "--db").context("--db is required")?;
    let manager = open_manager(args)?;

    let local_state = match manager.load()? {
        LoadOutcome::Loaded { state, .. } => state,
        LoadOutcome::Migrated { state, notice, .. } => {
            println!("{}", notice.message());
            state
        }
        LoadOutcome::Empty => bail!("no local save to sync"),
        LoadOutcome::NeedsDecision { notice, .. }
        | LoadOutcome::Refused { notice, .. }
        | LoadOutcome::Corrupt { notice }
        | LoadOutcome::MigrationFailed { notice } => bail!("{}", notice.message()),
    };

    // Slots live in the same database as the local save (local-store
    // fallback backend); a second connection keeps the seams honest.
    let backend_store = SaveStore::open(db)?;
    backend_store.migrate()?;
    let backend = SqliteBackend::new(backend_store);

    let config = EngineConfig::default();
    let mut sync_manager = match arg_value(args, "--device") {
        Some(id) => SyncManager::with_device_id(backend, config, id.to_string()),
        None => SyncManager::new(backend, config),
    };

    let result = sync_manager.sync(&local_state, now_ms());
    log::info!(
        "sync finished: action={:?} success={}",
        result.action,
        result.success
    );
    println!("action:  {:?}", result.action);
    println!("message: {}", result.message);
    if let Some(conflict) = &result.conflict {
        println!("{}", serde_json::to_string_pretty(conflict)?);
        println!("resolve with the game client (keep-local / keep-remote / merge)");
    }
    if result.adopted.is_some() {
        println!("remote save adopted; local copy will refresh on next save");
    }
    Ok(())
}
