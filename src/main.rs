#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod catalog;
mod cli;
mod config;
mod error;
mod export;
mod features;
mod models;
mod rank;
mod score;
mod similarity;
mod tiers;

use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use catalog::Catalog;
use cli::{Cli, Command, ParamArgs};
use config::AppConfig;
use rank::{RankParams, RankedList};
use tiers::{PoolDefs, TierParams};

/// Everything resolved once per process before any scoring.
struct App {
    catalog: Catalog,
    config: AppConfig,
    quiet: bool,
    json: bool,
}

impl App {
    /// Configured parameters with command line overrides applied.
    fn params(&self, args: &ParamArgs) -> Result<(RankParams, TierParams)> {
        let mut rank = self.config.rank_params();
        let mut tiers = self.config.tiers.clone();
        args.apply(&mut rank, &mut tiers)?;
        Ok((rank, tiers))
    }

    fn pools(&self) -> &PoolDefs {
        &self.config.pools
    }
}

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let result = run(cli);

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = AppConfig::resolve(cli.config.as_deref())?;
    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| config.catalog_path.clone())
        .unwrap_or_else(catalog::default_catalog_path);
    let catalog = Catalog::load(&catalog_path)?;
    if catalog.is_empty() {
        warn!("Catalog {} has no tracks", catalog_path.display());
    }

    let app = App {
        catalog,
        config,
        quiet: cli.quiet,
        json: cli.json,
    };

    match cli.command {
        Command::Rank { seed, params } => cmd_rank(&app, &seed, &params),
        Command::Tiers { seed, params } => cmd_tiers(&app, &seed, &params),
        Command::Export { seed, out, params } => cmd_export(&app, &seed, out.as_deref(), &params),
        Command::Batch {
            seeds,
            out_dir,
            params,
        } => cmd_batch(&app, &seeds, &out_dir, &params),
    }
}

fn rank_seed(app: &App, seed: &str, rank: &RankParams) -> Result<RankedList> {
    let ranked = rank::score_and_rank(&app.catalog, seed, rank)?;
    if ranked.skipped > 0 {
        warn!(
            "{} candidates could not be scored against {}",
            ranked.skipped, ranked.seed.id
        );
    }
    Ok(ranked)
}

fn cmd_rank(app: &App, seed: &str, args: &ParamArgs) -> Result<i32> {
    let (rank, _) = app.params(args)?;
    let ranked = rank_seed(app, seed, &rank)?;
    if ranked.tracks.is_empty() {
        return Ok(2);
    }
    for s in &ranked.tracks {
        if app.json {
            println!("{}", serde_json::to_string(s)?);
        } else {
            println!("{}", s.to_tsv());
        }
    }
    Ok(0)
}

fn cmd_tiers(app: &App, seed: &str, args: &ParamArgs) -> Result<i32> {
    let (rank, tier_params) = app.params(args)?;
    let ranked = rank_seed(app, seed, &rank)?;
    if ranked.tracks.is_empty() {
        return Ok(2);
    }
    let buckets = tiers::bucket(&ranked.tracks, &tier_params, app.pools());

    if app.json {
        for summary in &buckets.summary {
            println!("{}", serde_json::to_string(summary)?);
        }
        let sizes: Vec<_> = buckets.pools.iter().map(|(name, m)| (name, m.len())).collect();
        println!("{}", serde_json::to_string(&sizes)?);
        return Ok(0);
    }

    println!(
        "Seed: {} - {} ({} candidates)\n",
        ranked.seed.artists_display(),
        ranked.seed.name,
        ranked.tracks.len()
    );
    println!("Tiers:");
    for s in &buckets.summary {
        let range = match (s.max_fit, s.min_fit) {
            (Some(hi), Some(lo)) => format!("{hi:.4} .. {lo:.4}"),
            _ => "-".to_string(),
        };
        println!("  {}: {} tracks, radio fit {range}", s.tier, s.count);
    }
    println!("\nPools:");
    for (name, members) in &buckets.pools {
        let tier_set: Vec<String> = app.pools()[name].iter().map(u8::to_string).collect();
        println!("  {name} [{}]: {}", tier_set.join(","), members.len());
    }
    Ok(0)
}

fn build_profile(
    app: &App,
    seed: &str,
    rank: &RankParams,
    tier_params: &TierParams,
) -> Result<export::ProfileDocument> {
    let ranked = rank_seed(app, seed, rank)?;
    let buckets = tiers::bucket(&ranked.tracks, tier_params, app.pools());
    export::build_profile(&ranked, &buckets, tier_params, app.pools(), Utc::now())
}

fn cmd_export(app: &App, seed: &str, out: Option<&Path>, args: &ParamArgs) -> Result<i32> {
    let (rank, tier_params) = app.params(args)?;
    let doc = build_profile(app, seed, &rank, &tier_params)?;
    match out {
        Some(path) => {
            export::write_profile(&doc, path)?;
            info!("Wrote {} tracks to {}", doc.tracks.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }
    Ok(if doc.tracks.is_empty() { 2 } else { 0 })
}

fn read_seed_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed list: {}", path.display()))?;
    Ok(content
        .lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn cmd_batch(app: &App, seeds_file: &Path, out_dir: &Path, args: &ParamArgs) -> Result<i32> {
    let seeds = read_seed_list(seeds_file)?;
    if seeds.is_empty() {
        bail!("No seeds in {}", seeds_file.display());
    }
    let (rank, tier_params) = app.params(args)?;

    let pb = if app.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(seeds.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .context("progress bar template")?,
        );
        pb.set_message("Exporting profiles");
        pb
    };

    let mut written = 0usize;
    let mut failed = 0usize;
    for seed in &seeds {
        pb.inc(1);
        let result = build_profile(app, seed, &rank, &tier_params).and_then(|doc| {
            let path = out_dir.join(format!("{}.json", doc.name));
            export::write_profile(&doc, &path)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                written += 1;
                info!("{seed} -> {}", path.display());
            }
            Err(e) => {
                failed += 1;
                warn!("Skipping seed {seed}: {e:#}");
            }
        }
    }
    pb.finish_and_clear();

    if !app.quiet {
        eprintln!("Exported {written} profiles, {failed} failed");
    }
    Ok(i32::from(written == 0))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_read_seed_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# seeds\nabc\n\n  spotify:track:x  # comment\n#skip").unwrap();
        let seeds = read_seed_list(file.path()).unwrap();
        assert_eq!(seeds, vec!["abc", "spotify:track:x"]);
    }
}
