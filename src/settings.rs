use clap::Parser;

/// All user-facing times are snapped to multiples of this grid.
pub const TICK_MS: u32 = 50;

/// Narrowest block the editor will ever commit; one grid step.
pub const MIN_BLOCK_MS: u32 = 50;

/// Width given to a freshly inserted block, clamped against neighbours.
pub const DEFAULT_BLOCK_MS: u32 = 5000;

pub const DANCER_COUNT: usize = 7;

pub const HISTORY_CAP: usize = 50;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = "LightDance Editor")]
pub struct Cli {
    /// Path to a raw show dump (keyframe JSON) to load on start
    #[arg(long = "show")]
    pub show_path: Option<String>,

    #[arg(long = "loglevel",default_value_t=String::from("info"))]
    pub log_level: String,

    /// Track length in ms, used when starting from a blank or demo show
    #[arg(long = "duration", default_value_t = 180_000)]
    pub duration: u32,

    /// Part schema for blank/demo shows, selected by part count (9, 14 or 15)
    #[arg(long = "schema", default_value_t = 14)]
    pub schema_parts: usize,

    /// Write the hardware-ready light table (packed players JSON) to this path
    #[arg(long = "export")]
    pub export_path: Option<String>,

    /// Write the raw keyframe dump to this path
    #[arg(long = "raw-out")]
    pub raw_out_path: Option<String>,

    /// Generate a random demo show instead of loading one
    #[arg(long = "demo")]
    pub demo: bool,

    /// Seed for the demo generator (random if omitted)
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Play the show against the wall clock, logging resolved colours
    #[arg(long = "preview")]
    pub preview: bool,
}
