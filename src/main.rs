use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use incidence_lag::AnalysisConfig;
use incidence_lag::pipeline::{RateTables, process_batch, scan_paired, scan_rows, source_name};
use incidence_lag::utils::io::{find_parquet_files, write_records};
use log::{error, info, warn};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

const USAGE: &str = "usage: incidence-lag <config.json> <incidence.parquet | directory>...";

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(config_path) = args.next() else {
        bail!(USAGE);
    };
    let mut inputs: Vec<PathBuf> = Vec::new();
    for arg in args {
        if arg.is_dir() {
            inputs.extend(
                find_parquet_files(&arg)
                    .with_context(|| format!("listing {}", arg.display()))?,
            );
        } else {
            inputs.push(arg);
        }
    }

    let config = AnalysisConfig::from_json_file(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    info!("{config}");

    if inputs.is_empty() && config.paired_inputs.is_empty() {
        bail!("no incidence tables given and no paired inputs configured\n{USAGE}");
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_threads())
        .build_global()
        .context("building the worker pool")?;

    let rate_tables = config
        .rate_inputs
        .as_ref()
        .map(|inputs| RateTables::load(inputs, &config))
        .transpose()
        .context("loading rate tables")?;

    let start = Instant::now();
    let mut failures = 0;

    for (path, result) in process_batch(&inputs, &config) {
        let stem = source_name(&path);
        let written = result.and_then(|report| {
            let mut files = report.write(
                &config.output_dir,
                &stem,
                config.imputation.emit_unqualified_rows,
            )?;
            if let Some(tables) = &rate_tables {
                let paired = tables.pair(&report.series);
                let paired_path = config.output_dir.join(format!("{stem}_paired.parquet"));
                write_records(&paired_path, &paired)?;
                files.push(paired_path);

                let lag_path = config.output_dir.join(format!("{stem}_lag.parquet"));
                scan_rows(&stem, &paired, &config)?.write(&lag_path)?;
                files.push(lag_path);
            }
            Ok(files)
        });
        match written {
            Ok(files) => info!("{}: wrote {} tables", path.display(), files.len()),
            Err(e) => {
                error!("{}: {e}", path.display());
                failures += 1;
            }
        }
    }

    for path in &config.paired_inputs {
        let output = config
            .output_dir
            .join(format!("{}_lag.parquet", source_name(path)));
        match scan_paired(path, &config).and_then(|report| report.write(&output)) {
            Ok(()) => info!("{}: lag table written to {}", path.display(), output.display()),
            Err(e) => {
                error!("{}: {e}", path.display());
                failures += 1;
            }
        }
    }

    info!("Finished in {:?}", start.elapsed());
    if failures > 0 {
        warn!("{failures} inputs failed");
        bail!("{failures} inputs failed");
    }
    Ok(())
}
