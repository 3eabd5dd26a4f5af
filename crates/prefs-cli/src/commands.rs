use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use prefs_file::{CodecConfig, FileConfig, SnapshotFile, StorePaths};
use prefs_types::{Snapshot, TypeTag, Value};
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        lock,
        ..
    } = cli;
    match command {
        Command::Show(args) => cmd_show(&open(&args.file, lock), format),
        Command::Get(args) => cmd_get(&open(&args.file, lock), &args.key, format),
        Command::Set(args) => {
            let value = parse_value(args.kind.into(), args.values)?;
            cmd_set(&open(&args.file, lock), args.key, value)
        }
        Command::Remove(args) => cmd_remove(&open(&args.file, lock), &args.key),
        Command::Rename(args) => cmd_rename(&open(&args.file, lock), args.name),
    }
}

fn open(file: &Path, lock: Option<PathBuf>) -> SnapshotFile {
    let paths = match lock {
        Some(lock) => StorePaths::new(file, lock),
        None => StorePaths::beside(file),
    };
    let config = FileConfig {
        codec: CodecConfig {
            pretty: true,
            ..CodecConfig::default()
        },
        ..FileConfig::default()
    };
    SnapshotFile::with_config(paths, config)
}

/// Parse command-line values into a store value of the given kind.
pub(crate) fn parse_value(tag: TypeTag, values: Vec<String>) -> anyhow::Result<Value> {
    let value = match tag {
        TypeTag::Set => Value::string_set(values),
        TypeTag::Int => {
            let raw = single(tag, values)?;
            Value::Int32(raw.parse().with_context(|| format!("not an int: {raw}"))?)
        }
        TypeTag::Long => {
            let raw = single(tag, values)?;
            Value::Int64(raw.parse().with_context(|| format!("not a long: {raw}"))?)
        }
        TypeTag::Float => {
            let raw = single(tag, values)?;
            let v: f32 = raw.parse().with_context(|| format!("not a float: {raw}"))?;
            if !v.is_finite() {
                bail!("float values must be finite: {raw}");
            }
            Value::Float32(v)
        }
        TypeTag::Boolean => {
            let raw = single(tag, values)?;
            Value::Bool(raw.parse().with_context(|| format!("not a boolean: {raw}"))?)
        }
        TypeTag::String => Value::String(single(tag, values)?),
    };
    Ok(value)
}

fn single(tag: TypeTag, values: Vec<String>) -> anyhow::Result<String> {
    let [raw]: [String; 1] = values
        .try_into()
        .map_err(|values: Vec<String>| {
            anyhow!("--type {tag} takes exactly one value, got {}", values.len())
        })?;
    Ok(raw)
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int32(v) => json!(v),
        Value::Int64(v) => json!(v),
        // Go through the shortest decimal form so 0.1f32 prints as 0.1.
        Value::Float32(v) => v
            .to_string()
            .parse::<f64>()
            .map_or(serde_json::Value::Null, |wide| json!(wide)),
        Value::Bool(v) => json!(v),
        Value::String(v) => json!(v),
        Value::StringSet(items) => json!(items),
    }
}

fn snapshot_json(snapshot: &Snapshot) -> serde_json::Value {
    let entries: serde_json::Map<String, serde_json::Value> = snapshot
        .iter()
        .map(|(key, value)| {
            (
                key.to_string(),
                json!({ "type": value.type_tag(), "value": to_json(value) }),
            )
        })
        .collect();
    json!({ "name": snapshot.name, "entries": entries })
}

fn cmd_show(file: &SnapshotFile, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = file.read()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot_json(&snapshot))?)
        }
        OutputFormat::Text => {
            match &snapshot.name {
                Some(name) => println!("Store {}", name.bold()),
                None => println!("Store {}", "(unnamed)".dimmed()),
            }
            if snapshot.is_empty() {
                println!("  {}", "no entries".dimmed());
            }
            for (key, value) in snapshot.iter() {
                let tag = format!("{:<7}", value.type_tag());
                println!("  {} {} = {}", tag.cyan(), key.bold(), value);
            }
        }
    }
    Ok(())
}

fn cmd_get(file: &SnapshotFile, key: &str, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = file.read()?;
    let Some(value) = snapshot.get(key) else {
        bail!("no entry for key {key:?} in {}", file.paths().data.display());
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "key": key, "type": value.type_tag(), "value": to_json(value) })
        ),
        OutputFormat::Text => println!("{value}"),
    }
    Ok(())
}

fn cmd_set(file: &SnapshotFile, key: String, value: Value) -> anyhow::Result<()> {
    let shown = format!("{} {} = {}", value.type_tag(), key.bold(), value);
    file.update(|snapshot| {
        snapshot.insert(key, value)?;
        Ok(())
    })?;
    println!("{} Set {}", "✓".green().bold(), shown);
    Ok(())
}

fn cmd_remove(file: &SnapshotFile, key: &str) -> anyhow::Result<()> {
    let mut removed = false;
    file.update(|snapshot| {
        removed = snapshot.remove(key).is_some();
        Ok(())
    })?;
    if removed {
        println!("{} Removed {}", "✓".green().bold(), key.bold());
    } else {
        println!("{} was not set", key.bold());
    }
    Ok(())
}

fn cmd_rename(file: &SnapshotFile, name: String) -> anyhow::Result<()> {
    file.update(|snapshot| {
        snapshot.name = Some(name.clone());
        Ok(())
    })?;
    println!("{} Store renamed to {}", "✓".green().bold(), name.yellow());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_each_kind() {
        assert_eq!(parse_value(TypeTag::Int, strings(&["7"])).unwrap(), Value::Int32(7));
        assert_eq!(
            parse_value(TypeTag::Long, strings(&["9223372036854775807"])).unwrap(),
            Value::Int64(i64::MAX)
        );
        assert_eq!(parse_value(TypeTag::Float, strings(&["1.5"])).unwrap(), Value::Float32(1.5));
        assert_eq!(parse_value(TypeTag::Boolean, strings(&["true"])).unwrap(), Value::Bool(true));
        assert_eq!(parse_value(TypeTag::String, strings(&["x"])).unwrap(), Value::from("x"));
        assert_eq!(
            parse_value(TypeTag::Set, strings(&["b", "a", "b"])).unwrap(),
            Value::string_set(["a", "b"])
        );
        assert_eq!(parse_value(TypeTag::Set, Vec::new()).unwrap(), Value::string_set(Vec::<String>::new()));
    }

    #[test]
    fn scalar_kinds_need_exactly_one_value() {
        assert!(parse_value(TypeTag::Int, Vec::new()).is_err());
        assert!(parse_value(TypeTag::String, strings(&["a", "b"])).is_err());
    }

    #[test]
    fn bad_scalars_are_rejected() {
        assert!(parse_value(TypeTag::Int, strings(&["2147483648"])).is_err());
        assert!(parse_value(TypeTag::Boolean, strings(&["yes"])).is_err());
        assert!(parse_value(TypeTag::Float, strings(&["NaN"])).is_err());
        assert!(parse_value(TypeTag::Float, strings(&["inf"])).is_err());
    }

    #[test]
    fn set_get_remove_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = open(&dir.path().join("p.json"), None);

        cmd_set(&file, "n".into(), Value::Int32(3)).unwrap();
        cmd_rename(&file, "demo".into()).unwrap();
        cmd_get(&file, "n", OutputFormat::Json).unwrap();

        let snap = file.read().unwrap();
        assert_eq!(snap.name.as_deref(), Some("demo"));
        assert_eq!(snap.get("n"), Some(&Value::Int32(3)));

        cmd_remove(&file, "n").unwrap();
        assert!(file.read().unwrap().is_empty());
        assert!(cmd_get(&file, "n", OutputFormat::Text).is_err());
    }

    #[test]
    fn explicit_lock_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("locks").join("custom.lock");
        let file = open(&dir.path().join("p.json"), Some(lock.clone()));

        cmd_set(&file, "k".into(), Value::from("v")).unwrap();
        assert!(lock.exists());
        assert!(!dir.path().join("p.json.lock").exists());
    }

    #[test]
    fn snapshot_json_lists_typed_entries() {
        let mut snap = Snapshot::named("s");
        snap.insert("tags", Value::string_set(["x"])).unwrap();
        let doc = snapshot_json(&snap);
        assert_eq!(doc["name"], "s");
        assert_eq!(doc["entries"]["tags"]["type"], "set");
        assert_eq!(doc["entries"]["tags"]["value"], json!(["x"]));
    }
}
