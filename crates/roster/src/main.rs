//! `roster` - CLI for the roster record store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use regex::Regex;

use roster::cli::{AddCommand, Cli, Command, ConfigCommand, DeleteCommand, ListCommand, ShowCommand};
use roster::record::{flatten, Kind, RecordKey};
use roster::store::{DirMedium, StoreOptions};
use roster::{init_logging, Config, Error, Store};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.storage.data_dir = Some(dir);
        config.validate()?;
    }

    let mutating = cli.command.is_mutating();
    match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        Command::Check(report) => return handle_check(&config, report.json),
        _ => {}
    }

    let mut store = Store::open(&config)
        .with_context(|| format!("failed to load records from {}", config.data_dir().display()))?;

    match cli.command {
        Command::List(cmd) => handle_list(&store, &cmd)?,
        Command::Show(cmd) => handle_show(&store, &cmd)?,
        Command::Add(cmd) => handle_add(&mut store, cmd)?,
        Command::Delete(cmd) => handle_delete(&mut store, &cmd)?,
        Command::Graph(report) => handle_graph(&store, report.json)?,
        Command::Status(report) => handle_status(&config, &store, report.json)?,
        Command::Config(_) | Command::Check(_) => {}
    }

    if mutating {
        store.try_save_all()?;
    }
    Ok(())
}

fn parse_key(kind: Kind, text: &str) -> Result<RecordKey> {
    RecordKey::parse(kind, text).ok_or_else(|| anyhow!("'{text}' is not a valid {kind} key"))
}

fn handle_list(store: &Store, cmd: &ListCommand) -> Result<()> {
    let kind = Kind::from(cmd.kind);
    let pattern = cmd
        .matching
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --matching pattern")?;

    let rows: Vec<_> = store
        .records(kind)
        .map(|record| (record.key(), record.summary()))
        .filter(|(_, summary)| pattern.as_ref().map_or(true, |re| re.is_match(summary)))
        .collect();

    if cmd.json {
        let rows: Vec<_> = rows
            .iter()
            .map(|(key, summary)| serde_json::json!({ "key": key, "summary": summary }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No {kind} records.");
    } else {
        for (_, summary) in rows {
            println!("{summary}");
        }
    }
    Ok(())
}

fn handle_show(store: &Store, cmd: &ShowCommand) -> Result<()> {
    let kind = Kind::from(cmd.kind);
    let key = parse_key(kind, &cmd.key)?;
    let record = store
        .get(kind, &key)
        .ok_or_else(|| Error::not_found(kind, key.clone()))?;

    if cmd.json {
        let shown = serde_json::json!({
            "kind": kind,
            "key": key,
            "summary": record.summary(),
            "fields": record.display_fields(),
        });
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let pairs = flatten(&record.display_fields());
    let width = pairs.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, value) in pairs {
        println!("{name:<width$}  {value}");
    }
    Ok(())
}

fn handle_add(store: &mut Store, cmd: AddCommand) -> Result<()> {
    let handle = store.add(cmd.into_record())?;
    if let Some(record) = store.record(handle) {
        println!("Added {}: {}", record.kind(), record.summary());
        for (field, reference) in record.references() {
            if reference.is_dangling() {
                println!("  warning: {field} '{}' does not exist", reference.stored());
            }
        }
    }
    Ok(())
}

fn handle_delete(store: &mut Store, cmd: &DeleteCommand) -> Result<()> {
    let kind = Kind::from(cmd.kind);
    let key = parse_key(kind, &cmd.key)?;
    let report = store.delete(kind, &key, &cmd.reason)?;
    for (kind, key) in &report.removed {
        println!("Deleted {kind} '{key}'");
    }
    println!(
        "{} reference(s) tombstoned ({})",
        report.tombstoned, report.reason
    );
    Ok(())
}

fn handle_graph(store: &Store, json: bool) -> Result<()> {
    let links = store.links();
    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
    } else if links.is_empty() {
        println!("No links.");
    } else {
        for link in links {
            println!(
                "{} '{}' -{}-> {} '{}'",
                link.from_kind, link.from, link.field, link.to_kind, link.to
            );
        }
    }
    Ok(())
}

fn handle_check(config: &Config, json: bool) -> Result<()> {
    let options = StoreOptions {
        skip_malformed: config.load.skip_malformed,
    };
    let medium = DirMedium::new(config.data_dir(), false);
    let mut store = Store::with_medium(Box::new(medium), options);
    let report = store.load_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for kind in Kind::ALL {
        let count = report.loaded.get(&kind).copied().unwrap_or(0);
        println!("{:<14} {count}", format!("{kind}s:"));
    }
    println!("{:<14} {}", "Malformed:", report.malformed);
    println!("{:<14} {}", "Duplicates:", report.duplicates);
    println!("{:<14} {}", "Dangling:", report.dangling);
    Ok(())
}

fn handle_status(config: &Config, store: &Store, json: bool) -> Result<()> {
    if json {
        let counts: std::collections::BTreeMap<Kind, usize> =
            Kind::ALL.iter().map(|&kind| (kind, store.len(kind))).collect();
        let status = serde_json::json!({
            "data_dir": config.data_dir(),
            "config_path": Config::default_config_path(),
            "records": counts,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("roster status");
        println!("-------------");
        println!("Data:          {}", config.data_dir().display());
        println!("Config:        {}", Config::default_config_path().display());
        for kind in Kind::ALL {
            println!("{:<14} {}", format!("{kind}s:"), store.len(kind));
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Backup on save:     {}", config.storage.backup_on_save);
                println!();
                println!("[Load]");
                println!("  Skip malformed:     {}", config.load.skip_malformed);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
