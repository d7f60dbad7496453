//! CLI command implementations.

use geoseal_client::SearchClient;
use geoseal_index::{blob, build_integrity_tags, setup as run_setup, verify_integrity};
use geoseal_rpc::CspClient;
use geoseal_types::{RawRecord, SearchConfig};
use std::net::SocketAddr;
use std::path::Path;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// Load the TOML config, or the built-in defaults when no path is given.
pub fn load_config(
    path: Option<&Path>,
) -> std::result::Result<SearchConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SearchConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config: SearchConfig = toml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

fn read_records(
    csv_path: &Path,
    delimiter: char,
) -> std::result::Result<Vec<RawRecord>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .from_path(csv_path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: RawRecord = row?;
        records.push(record);
    }
    Ok(records)
}

pub fn setup(config: &SearchConfig, csv: &Path, out_dir: &Path, delimiter: char) -> Result {
    let records = read_records(csv, delimiter)?;
    if records.is_empty() {
        return Err("dataset is empty".into());
    }
    println!("Encoding {} records...", records.len());

    let (aui, keys) = run_setup(&records, config)?;

    std::fs::create_dir_all(out_dir)?;
    let aui_path = out_dir.join("aui.bin");
    let key_path = out_dir.join("keys.bin");
    blob::save_aui(&aui_path, &aui)?;
    blob::save_keys(&key_path, &keys)?;

    // Sanity check the at-rest tags before anything ships.
    let tags = build_integrity_tags(&aui, &keys);
    if !verify_integrity(&aui, &keys, &tags) {
        return Err("freshly built index failed its own integrity check".into());
    }

    println!("AUI written to {}", aui_path.display());
    println!("Keys written to {} (keep private)", key_path.display());
    Ok(())
}

pub async fn serve(aui_path: Option<&Path>, port: u16) -> Result {
    let initial = match aui_path {
        Some(path) => {
            let aui = blob::load_aui(path)?;
            println!(
                "Loaded index: {} records, m1={}, m2={}",
                aui.record_count(),
                aui.m1,
                aui.m2
            );
            Some(aui)
        }
        None => {
            println!("Starting without an index; waiting for /load_index.");
            None
        }
    };

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    geoseal_csp::serve(addr, initial).await?;
    Ok(())
}

pub async fn provision(aui_path: &Path, csp_urls: &[String]) -> Result {
    if csp_urls.is_empty() {
        return Err("at least one --csp endpoint is required".into());
    }
    let blob_bytes = std::fs::read(aui_path)?;
    for url in csp_urls {
        let client = CspClient::new(url);
        client.load_index_blob(&blob_bytes).await?;
        println!("Provisioned {}", url);
    }
    Ok(())
}

pub async fn query(
    config: &SearchConfig,
    query_text: &str,
    aui_path: &Path,
    key_path: &Path,
    csp_urls: &[String],
) -> Result {
    let aui = blob::load_aui(aui_path)?;
    let keys = blob::load_keys(key_path)?;

    if csp_urls.len() != aui.parties as usize {
        return Err(format!(
            "index expects {} CSP endpoints, got {}",
            aui.parties,
            csp_urls.len()
        )
        .into());
    }

    let csps: Vec<CspClient> = csp_urls.iter().map(|u| CspClient::new(u)).collect();
    let client = SearchClient::new(csps, aui, keys, config.clone())?;
    log::info!("dispatching query to {} CSPs", csp_urls.len());
    let outcome = client.run(query_text).await?;

    println!("Verification: pass");
    println!("Matches: {}", outcome.hits.len());
    for (i, id) in outcome.hits.iter().enumerate() {
        println!("{:>4}. {}", i + 1, id);
    }
    Ok(())
}
