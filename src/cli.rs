use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::rank::RankParams;
use crate::tiers::TierParams;

#[derive(Parser)]
#[command(name = "rfit", about = "Seed-based radio fit ranking and profile export")]
pub struct Cli {
    /// Suppress stderr output (progress bars, status messages).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results as JSON lines (NDJSON).
    #[arg(long, global = true)]
    pub json: bool,

    /// Track catalog (JSON array of track records).
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// TOML config file with scoring, filter, tier and pool settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rank catalog tracks by radio fit against a seed.
    Rank {
        /// Seed track id or uri.
        seed: String,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Show tier boundaries and pool sizes for a seed.
    Tiers {
        /// Seed track id or uri.
        seed: String,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Export a profile document for a seed.
    Export {
        /// Seed track id or uri.
        seed: String,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Export one profile per seed listed in a file.
    Batch {
        /// File with one seed id or uri per line. `#` starts a comment.
        seeds: PathBuf,

        /// Directory receiving `<artist>-<name>.json` profiles.
        #[arg(long)]
        out_dir: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },
}

/// Per-run overrides of configured parameters.
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// Weight of audio feature similarity.
    #[arg(long)]
    pub audio_weight: Option<f64>,

    /// Weight of genre overlap.
    #[arg(long)]
    pub genre_weight: Option<f64>,

    /// Weight of era proximity.
    #[arg(long)]
    pub era_weight: Option<f64>,

    /// Weight of popularity proximity.
    #[arg(long)]
    pub pop_weight: Option<f64>,

    /// Era decay in years.
    #[arg(long)]
    pub era_decay: Option<f64>,

    /// Popularity decay in points.
    #[arg(long)]
    pub pop_decay: Option<f64>,

    /// Genre overlap bonus multiplier.
    #[arg(long, allow_negative_numbers = true)]
    pub genre_boost: Option<f64>,

    /// Adjustment when both tracks have genres but share none.
    #[arg(long, allow_negative_numbers = true)]
    pub genre_penalty: Option<f64>,

    /// Keep remasters and alternate versions.
    #[arg(long)]
    pub include_remasters: bool,

    /// Minimum candidate popularity.
    #[arg(long)]
    pub pop_floor: Option<i32>,

    /// Drop candidates at or above this speechiness.
    #[arg(long)]
    pub max_speechiness: Option<f64>,

    /// Drop candidates scoring below this.
    #[arg(long)]
    pub radio_fit_floor: Option<f64>,

    /// Maximum ranked candidates (0 for unlimited).
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Percentile boundaries of tiers 1-4, e.g. `20,40,60,80`.
    #[arg(long, value_delimiter = ',')]
    pub tiers: Option<Vec<f64>>,
}

impl ParamArgs {
    /// Overlay the given flags onto configured parameters.
    pub fn apply(&self, rank: &mut RankParams, tiers: &mut TierParams) -> Result<()> {
        let s = &mut rank.scoring;
        let overrides = [
            (&mut s.audio_weight, self.audio_weight),
            (&mut s.genre_weight, self.genre_weight),
            (&mut s.era_weight, self.era_weight),
            (&mut s.pop_weight, self.pop_weight),
            (&mut s.era_decay, self.era_decay),
            (&mut s.pop_decay, self.pop_decay),
            (&mut s.genre_boost, self.genre_boost),
            (&mut s.genre_penalty, self.genre_penalty),
        ];
        for (field, value) in overrides {
            if let Some(v) = value {
                *field = v;
            }
        }

        let f = &mut rank.filters;
        if self.include_remasters {
            f.include_remasters = true;
        }
        if let Some(v) = self.pop_floor {
            f.pop_floor = v;
        }
        if let Some(v) = self.max_speechiness {
            f.max_speechiness = v;
        }
        if let Some(v) = self.radio_fit_floor {
            f.radio_fit_floor = v;
        }
        if let Some(v) = self.limit {
            f.limit = v;
        }

        match self.tiers.as_deref() {
            None => {}
            Some(&[t1, t2, t3, t4]) => {
                *tiers = TierParams {
                    tier_1_pct: t1,
                    tier_2_pct: t2,
                    tier_3_pct: t3,
                    tier_4_pct: t4,
                };
            }
            Some(other) => bail!("--tiers takes 4 percentiles, got {}", other.len()),
        }
        Ok(())
    }
}
