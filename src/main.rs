use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::{fs, thread};

use anyhow::anyhow;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, info};

use crate::model::Model;
use crate::settings::{Cli, TICK_MS};
use crate::show::schema::schema_for_part_count;
use crate::show::Show;
use crate::timeline::evaluate;

mod codec;
mod color;
mod export;
mod history;
mod model;
mod playback;
mod settings;
mod show;
mod timeline;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut env_builder = Builder::from_env(Env::default().default_filter_or(&cli.log_level));
    env_builder.init();

    debug!("Started with settings: {:?}", cli);

    let show = match &cli.show_path {
        Some(path) => Show::load(path, cli.duration)?,
        None => {
            let schema = schema_for_part_count(cli.schema_parts)
                .ok_or_else(|| anyhow!("no costume schema with {} parts", cli.schema_parts))?;
            if cli.demo {
                info!("Generating a random demo show ({}ms)", cli.duration);
                export::random_show(schema, cli.duration, cli.seed)
            } else {
                info!("Starting with a blank show ({}ms)", cli.duration);
                Show::blank(schema, cli.duration)
            }
        }
    };

    let mut model = Model::new(show);

    if let Some(path) = &cli.raw_out_path {
        Show::save(path, &model.show)?;
    }

    if let Some(path) = &cli.export_path {
        let payload = export::hardware_table(&model.show);
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        info!("Exported hardware light table to \"{}\" OK", path);
    }

    if cli.preview {
        run_preview(&mut model)?;
    }

    Ok(())
}

/// Walk the playhead against the wall clock, resolving every part each
/// tick. Useful for eyeballing fades and export parity without hardware.
fn run_preview(model: &mut Model) -> anyhow::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    info!(
        "Previewing {}ms of show; Ctrl+C to stop early",
        model.show.duration
    );
    while running.load(Ordering::SeqCst) {
        let t = model.playback.position();
        if t >= model.show.duration {
            break;
        }
        for (dancer, parts) in model.show.tracks.iter().enumerate() {
            for (part, seq) in parts.iter().enumerate() {
                let color = evaluate(seq, t);
                if !color.is_black() {
                    debug!(
                        "{}ms dancer{} {}: {:?}",
                        t,
                        dancer,
                        model.show.schema.part_name(part),
                        color
                    );
                }
            }
        }
        thread::sleep(Duration::from_millis(TICK_MS as u64));
        model.playback.step_forward();
    }
    info!("Preview stopped at {}ms", model.playback.position());

    Ok(())
}
