//! Status command - inspect the stores

use super::{open_storage, Host};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::{Config, ConfigManager};
use crate::error::BundleResult;
use crate::keys;
use crate::manifest::ResourceManifest;
use crate::store::CacheStorage;
use crate::ui::{self, UiContext};
use crate::worker::{is_retained, load_record, missing_keys};
use console::style;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct StoreStatus {
    role: &'static str,
    name: String,
    exists: bool,
    entries: usize,
}

#[derive(Debug, Serialize)]
struct BundleStatus {
    origin: String,
    version: Option<String>,
    resources: usize,
    /// Resources whose fingerprint matches the stored record
    unchanged: usize,
    /// Resources not in the content store yet
    missing: usize,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    root: PathBuf,
    stores: Vec<StoreStatus>,
    /// Resource count of the stored manifest record
    record: Option<usize>,
    bundle: Option<BundleStatus>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> BundleResult<()> {
    let report = collect(config).await?;

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report),
    }
    Ok(())
}

async fn collect(config: &Config) -> BundleResult<StatusReport> {
    let storage = open_storage(config);
    let names = &config.stores.names;

    let mut stores = Vec::with_capacity(3);
    for (role, name) in [
        ("content", &names.content),
        ("staging", &names.staging),
        ("manifest", &names.manifest),
    ] {
        stores.push(store_status(&*storage, role, name).await?);
    }

    let record = load_record(&*storage, &names.manifest).await?;

    let bundle = if config.app.origin.is_some() && config.app.bundle.is_some() {
        let host = Host::load(config).await?;
        Some(bundle_status(&host, &*storage, record.as_ref()).await?)
    } else {
        None
    };

    Ok(StatusReport {
        root: ConfigManager::stores_dir(config),
        stores,
        record: record.as_ref().map(ResourceManifest::len),
        bundle,
    })
}

async fn store_status(
    storage: &dyn CacheStorage,
    role: &'static str,
    name: &str,
) -> BundleResult<StoreStatus> {
    let exists = storage.has(name).await?;
    let entries = if exists {
        storage.open(name).await?.keys().await?.len()
    } else {
        0
    };
    Ok(StoreStatus {
        role,
        name: name.to_string(),
        exists,
        entries,
    })
}

async fn bundle_status(
    host: &Host,
    storage: &dyn CacheStorage,
    record: Option<&ResourceManifest>,
) -> BundleResult<BundleStatus> {
    let config = &host.config;
    let resources = &config.bundle.resources;

    let cached: Vec<String> = if storage.has(&config.stores.content).await? {
        storage
            .open(&config.stores.content)
            .await?
            .keys()
            .await?
            .iter()
            .map(|url| keys::storage_key(&config.origin, url))
            .collect()
    } else {
        Vec::new()
    };

    let unchanged = match record {
        Some(old) => resources
            .keys()
            .filter(|key| is_retained(old, resources, key))
            .count(),
        None => 0,
    };

    Ok(BundleStatus {
        origin: config.origin.clone(),
        version: config.bundle.version.clone(),
        resources: resources.len(),
        unchanged,
        missing: missing_keys(resources, cached.iter().map(String::as_str)).len(),
    })
}

fn print_table(report: &StatusReport) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Cache status");
    ui::key_value(&ctx, "Root", &report.root.display().to_string());

    ui::section(&ctx, "Stores");
    println!(
        "{:<10} {:<24} {:<8}",
        style("ROLE").bold(),
        style("STORE").bold(),
        style("ENTRIES").bold()
    );
    println!("{}", "-".repeat(44));
    for store in &report.stores {
        let entries = if store.exists {
            store.entries.to_string()
        } else {
            style("absent").dim().to_string()
        };
        println!("{:<10} {:<24} {:<8}", store.role, store.name, entries);
    }
    println!();

    match report.record {
        Some(count) => ui::key_value(&ctx, "Manifest record", &format!("{} resources", count)),
        None => ui::key_value_status(&ctx, "Manifest record", "none (next activation is a cold start)", false),
    }

    match report.bundle {
        Some(ref bundle) => {
            ui::section(&ctx, "Bundle");
            ui::key_value(&ctx, "Origin", &bundle.origin);
            if let Some(ref version) = bundle.version {
                ui::key_value(&ctx, "Bundle version", version);
            }
            ui::key_value(&ctx, "Resources", &bundle.resources.to_string());
            ui::key_value(&ctx, "Unchanged", &bundle.unchanged.to_string());
            ui::key_value_status(
                &ctx,
                "Missing",
                &bundle.missing.to_string(),
                bundle.missing == 0,
            );
            if bundle.missing == 0 {
                ui::outro_success(&ctx, "Fully available offline");
            } else {
                ui::outro_warn(&ctx, "Run: bundlecache message download-offline");
            }
        }
        None => ui::outro_warn(&ctx, "No bundle configured"),
    }
}

fn print_plain(report: &StatusReport) {
    println!("root={}", report.root.display());
    for store in &report.stores {
        println!("store.{}={} entries={}", store.role, store.name, store.entries);
    }
    match report.record {
        Some(count) => println!("record={}", count),
        None => println!("record=none"),
    }
    if let Some(ref bundle) = report.bundle {
        println!("resources={}", bundle.resources);
        println!("unchanged={}", bundle.unchanged);
        println!("missing={}", bundle.missing);
    }
}
