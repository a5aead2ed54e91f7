use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use dsv_server::{DsvServer, ServerConfig};
use dsv_store::{FsStore, Metadata, Payload, StoreConfig, VersionKind, VersionName, VersionStamp};
use serde_json::{json, Value};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let out = Output { format: cli.format };
    let open = || open_store(cli.root.clone());
    match cli.command {
        Command::PutMeta(args) => cmd_put_meta(&open()?, &out, args),
        Command::GetMeta(args) => cmd_get_meta(&open()?, &out, args),
        Command::UpdateMeta(args) => cmd_update_meta(&open()?, &out, args),
        Command::PutData(args) => cmd_put_data(&open()?, &out, args),
        Command::GetData(args) => cmd_get_data(&open()?, &out, args),
        Command::Path(args) => cmd_path(&open()?, &out, args),
        Command::Exists(args) => cmd_exists(&open()?, &out, args),
        Command::Rm(args) => cmd_rm(&open()?, &out, args),
        Command::Log(args) => cmd_log(&open()?, &out, args),
        Command::Ls => cmd_ls(&open()?, &out),
        Command::Serve(args) => cmd_serve(args, cli.root.clone()),
    }
}

struct Output {
    format: OutputFormat,
}

impl Output {
    fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn json(&self, value: &Value) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn open_store(root: Option<PathBuf>) -> anyhow::Result<FsStore> {
    let config = root.map(StoreConfig::new).unwrap_or_default();
    tracing::debug!(root = %config.root.display(), "opening dataset store");
    FsStore::open(&config)
        .with_context(|| format!("cannot open dataset store at {}", config.root.display()))
}

fn read_metadata(input: &MetadataInput) -> anyhow::Result<Value> {
    let text = match (&input.json, &input.file) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        (Some(json), None) => json.clone(),
        (None, None) => anyhow::bail!("no metadata given"),
    };
    serde_json::from_str(&text).context("metadata is not valid JSON")
}

fn cmd_put_meta(store: &FsStore, out: &Output, args: PutMetaArgs) -> anyhow::Result<()> {
    let metadata = read_metadata(&args.input)?;
    let path = store.store_metadata(args.dataset_id, metadata)?;
    if out.is_json() {
        return out.json(&json!({
            "dataset_id": args.dataset_id,
            "version": file_name(&path),
        }));
    }
    println!(
        "{} Stored metadata for {} ({})",
        "✓".green().bold(),
        args.dataset_id.to_string().yellow(),
        file_name(&path).dimmed()
    );
    Ok(())
}

fn cmd_get_meta(store: &FsStore, out: &Output, args: DatasetArgs) -> anyhow::Result<()> {
    let metadata = store.fetch_metadata(args.dataset_id)?;
    if out.is_json() {
        return out.json(&json!({"dataset_id": args.dataset_id, "metadata": metadata}));
    }
    print_metadata(&metadata)
}

fn cmd_update_meta(store: &FsStore, out: &Output, args: UpdateMetaArgs) -> anyhow::Result<()> {
    let metadata = read_metadata(&args.input)?;
    let merged = store.update_metadata(args.dataset_id, metadata, args.mode)?;
    if out.is_json() {
        return out.json(&json!({
            "dataset_id": args.dataset_id,
            "mode": args.mode,
            "metadata": merged,
        }));
    }
    println!(
        "{} Updated metadata for {} ({})",
        "✓".green().bold(),
        args.dataset_id.to_string().yellow(),
        args.mode.to_string().cyan()
    );
    print_metadata(&merged)
}

fn cmd_put_data(store: &FsStore, out: &Output, args: PutDataArgs) -> anyhow::Result<()> {
    let payload = match (args.text, args.file) {
        (Some(text), _) => Payload::text(text, args.encoding),
        (None, Some(path)) => Payload::Bytes(
            std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?,
        ),
        (None, None) => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("cannot read payload from stdin")?;
            Payload::Bytes(bytes)
        }
    };

    let path = store.store_data(args.dataset_id, payload)?;
    if out.is_json() {
        return out.json(&json!({
            "dataset_id": args.dataset_id,
            "version": file_name(&path),
        }));
    }
    println!(
        "{} Stored data for {} ({})",
        "✓".green().bold(),
        args.dataset_id.to_string().yellow(),
        file_name(&path).dimmed()
    );
    Ok(())
}

fn cmd_get_data(store: &FsStore, out: &Output, args: GetDataArgs) -> anyhow::Result<()> {
    if let Some(dest) = &args.out {
        let bytes = store.fetch_data(args.dataset_id)?;
        std::fs::write(dest, &bytes).with_context(|| format!("cannot write {}", dest.display()))?;
        if out.is_json() {
            return out.json(&json!({
                "dataset_id": args.dataset_id,
                "bytes": bytes.len(),
                "out": dest,
            }));
        }
        println!(
            "{} Wrote {} bytes to {}",
            "✓".green().bold(),
            bytes.len(),
            dest.display().to_string().bold()
        );
        return Ok(());
    }

    if args.text {
        let text = store.fetch_data_text(args.dataset_id, args.encoding)?;
        if out.is_json() {
            return out.json(&json!({"dataset_id": args.dataset_id, "text": text}));
        }
        println!("{text}");
        return Ok(());
    }

    let bytes = store.fetch_data(args.dataset_id)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_path(store: &FsStore, out: &Output, args: DatasetArgs) -> anyhow::Result<()> {
    let path = store.data_path(args.dataset_id)?;
    if out.is_json() {
        return out.json(&json!({"dataset_id": args.dataset_id, "path": path}));
    }
    println!("{}", path.display());
    Ok(())
}

fn cmd_exists(store: &FsStore, out: &Output, args: DatasetArgs) -> anyhow::Result<()> {
    let exists = store.dataset_exists(args.dataset_id);
    let dir_exists = store.dataset_dir_exists(args.dataset_id);
    if out.is_json() {
        return out.json(&json!({
            "dataset_id": args.dataset_id,
            "exists": exists,
            "dir_exists": dir_exists,
        }));
    }
    if exists {
        println!("{} {} exists", "✓".green(), args.dataset_id.to_string().yellow());
    } else if dir_exists {
        println!(
            "{} {} is incomplete (missing data or metadata)",
            "!".yellow().bold(),
            args.dataset_id.to_string().yellow()
        );
    } else {
        println!("{} {} does not exist", "✗".red(), args.dataset_id.to_string().yellow());
    }
    Ok(())
}

fn cmd_rm(store: &FsStore, out: &Output, args: DatasetArgs) -> anyhow::Result<()> {
    store.delete_dataset(args.dataset_id)?;
    if out.is_json() {
        return out.json(&json!({"dataset_id": args.dataset_id, "status": "deleted"}));
    }
    println!("Deleted dataset {}", args.dataset_id.to_string().yellow());
    Ok(())
}

fn cmd_log(store: &FsStore, out: &Output, args: LogArgs) -> anyhow::Result<()> {
    let kinds = match args.kind {
        Some(kind) => vec![kind],
        None => VersionKind::ALL.to_vec(),
    };

    let mut entries = Vec::new();
    for kind in kinds {
        let current = store.current_version(args.dataset_id, kind)?;
        for version in store.list_versions(args.dataset_id, kind)? {
            entries.push((version, current == Some(version)));
        }
    }
    // Newest first across both kinds.
    entries.sort_by(|(a, _), (b, _)| b.stamp.cmp(&a.stamp).then(a.kind.cmp(&b.kind)));

    if out.is_json() {
        let versions: Vec<Value> = entries
            .iter()
            .map(|(version, current)| {
                json!({
                    "kind": version.kind,
                    "file": version.file_name(),
                    "stamp": version.stamp.as_millis(),
                    "time": format_stamp(version.stamp),
                    "current": current,
                })
            })
            .collect();
        return out.json(&json!({"dataset_id": args.dataset_id, "versions": versions}));
    }

    if entries.is_empty() {
        println!("No versions.");
        return Ok(());
    }
    for (version, current) in &entries {
        print_version(version, *current);
    }
    Ok(())
}

fn cmd_ls(store: &FsStore, out: &Output) -> anyhow::Result<()> {
    let ids = store.list_datasets()?;
    if out.is_json() {
        let datasets: Vec<Value> = ids
            .iter()
            .map(|id| json!({"dataset_id": id, "complete": store.dataset_exists(*id)}))
            .collect();
        return out.json(&json!({"root": store.root(), "datasets": datasets}));
    }

    if ids.is_empty() {
        println!("No datasets under {}.", store.root().display());
        return Ok(());
    }
    for id in ids {
        let marker = if store.dataset_exists(id) {
            "✓".green()
        } else {
            "…".dimmed()
        };
        println!("{marker} {}", id.to_string().yellow());
    }
    Ok(())
}

fn cmd_serve(args: ServeArgs, root: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = root {
        config.store.root = root;
    }

    let server = DsvServer::new(config)?;
    println!(
        "Datasets server on {} (root: {})",
        server.config().bind_addr.to_string().bold(),
        server.store().root().display()
    );
    let runtime = tokio::runtime::Runtime::new().context("cannot start async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn print_metadata(metadata: &Metadata) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(metadata)?);
    Ok(())
}

fn print_version(version: &VersionName, current: bool) {
    let kind = match version.kind {
        VersionKind::Data => "data".blue(),
        VersionKind::Metadata => "meta".magenta(),
    };
    let marker = if current { "(current)".green() } else { "".normal() };
    println!(
        "{}  {:<4}  {}  {}",
        format_stamp(version.stamp).dimmed(),
        kind,
        version.file_name(),
        marker
    );
}

fn format_stamp(stamp: VersionStamp) -> String {
    i64::try_from(stamp.as_millis())
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| stamp.to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dsv_store::{DatasetId, MergeMode};

    fn run(root: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["dsv", "--root", root.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    fn store_at(root: &Path) -> FsStore {
        FsStore::open(&StoreConfig::new(root)).unwrap()
    }

    #[test]
    fn metadata_commands() {
        let dir = tempfile::tempdir().unwrap();
        let id = DatasetId::new().to_string();

        run(dir.path(), &["put-meta", &id, r#"{"name":"demo","v":1}"#]).unwrap();
        run(dir.path(), &["update-meta", &id, r#"{"v":2}"#, "--mode", "overlay"]).unwrap();
        run(dir.path(), &["--format", "json", "get-meta", &id]).unwrap();

        let store = store_at(dir.path());
        let metadata = store.fetch_metadata(id.parse().unwrap()).unwrap();
        assert_eq!(Value::Object(metadata), json!({"name": "demo", "v": 2}));
    }

    #[test]
    fn metadata_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("meta.json");
        std::fs::write(&file, r#"{"owner":"datasets-team"}"#).unwrap();
        let input = MetadataInput {
            json: None,
            file: Some(file),
        };
        assert_eq!(read_metadata(&input).unwrap(), json!({"owner": "datasets-team"}));

        let bad = MetadataInput {
            json: Some("{not json".into()),
            file: None,
        };
        assert!(read_metadata(&bad).is_err());
    }

    #[test]
    fn data_commands() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let id = DatasetId::new().to_string();
        let out = dir.path().join("out.bin");

        run(&root, &["put-meta", &id, "{}"]).unwrap();
        run(&root, &["put-data", &id, "--text", "café", "--encoding", "latin-1"]).unwrap();
        run(&root, &["get-data", &id, "--out", out.to_str().unwrap()]).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), vec![b'c', b'a', b'f', 0xe9]);

        run(&root, &["get-data", &id, "--text", "--encoding", "latin-1"]).unwrap();
        run(&root, &["path", &id]).unwrap();
        run(&root, &["exists", &id]).unwrap();
        run(&root, &["--format", "json", "log", &id]).unwrap();
        run(&root, &["ls"]).unwrap();
    }

    #[test]
    fn put_data_requires_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let id = DatasetId::new().to_string();
        let err = run(dir.path(), &["put-data", &id, "--text", "x"]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn rm_removes_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let id = DatasetId::new();
        let store = store_at(dir.path());
        store.store_metadata(id, json!({"a": 1})).unwrap();
        store
            .update_metadata(id, json!({"b": 2}), MergeMode::Overlay)
            .unwrap();

        run(dir.path(), &["rm", &id.to_string()]).unwrap();
        assert!(!store.dataset_dir_exists(id));
        run(dir.path(), &["rm", &id.to_string()]).unwrap();
    }

    #[test]
    fn stamps_render_as_utc() {
        assert_eq!(
            format_stamp(VersionStamp::from_millis(0)),
            "1970-01-01 00:00:00.000 UTC"
        );
        assert_eq!(
            format_stamp(VersionStamp::from_millis(1_718_000_000_123)),
            "2024-06-10 06:13:20.123 UTC"
        );
    }
}
