use anyhow::anyhow;
use indexmap::IndexMap;
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::codec::{decode, encode, keyframes_to_segments, Keyframe, PackFormat};
use crate::color::{Rgba, OFF};
use crate::settings::{DANCER_COUNT, TICK_MS};
use crate::show::schema::Schema;
use crate::show::Show;
use crate::timeline::{evaluate, quantize, Segment};

/// One row of a dancer's hardware table: a tick-based timestamp plus one
/// packed colour word per part, keyed by part name.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MergedStep {
    pub time: u32,
    #[serde(flatten)]
    pub parts: IndexMap<String, u32>,
}

/// The controller payload: one table per dancer. `pack_format` is absent
/// in files written by older exporters, which used the percent encoding.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayersPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_format: Option<PackFormat>,
    pub players: Vec<Vec<MergedStep>>,
}

fn sample(seq: &[Segment], t: u32) -> (Rgba, u8) {
    let linear = seq
        .iter()
        .find(|s| s.contains(t))
        .map(|s| s.linear)
        .unwrap_or(0);
    (evaluate(seq, t), linear)
}

/// Flatten a show into per-dancer controller tables.
///
/// Every part boundary for a dancer becomes one step, and every step
/// carries a word for every part, so the controller never has to look
/// back past the current row.
pub fn hardware_table(show: &Show) -> PlayersPayload {
    let players = show
        .tracks
        .iter()
        .map(|parts| {
            let mut times: Vec<u32> = parts
                .iter()
                .flatten()
                .flat_map(|s| [s.start_time, s.end_time])
                .collect();
            times.push(0);
            times.sort_unstable();
            times.dedup();

            times
                .iter()
                .map(|&t| {
                    let words = show
                        .schema
                        .parts
                        .iter()
                        .zip(parts)
                        .map(|(name, seq)| {
                            let (color, linear) = sample(seq, t);
                            (name.clone(), encode(&color, linear))
                        })
                        .collect();
                    MergedStep {
                        time: t / TICK_MS,
                        parts: words,
                    }
                })
                .collect()
        })
        .collect();

    PlayersPayload {
        pack_format: Some(PackFormat::AlphaLinear),
        players,
    }
}

/// Rebuild a show from controller tables. Steps may omit parts that did
/// not change; the previous word carries forward. A word decoding to
/// transparent black marks the part as off until its next step.
pub fn import_players(payload: &PlayersPayload, duration: u32) -> anyhow::Result<Show> {
    let format = payload.pack_format.unwrap_or_default();

    let part_count = payload
        .players
        .iter()
        .flat_map(|steps| steps.iter().map(|step| step.parts.len()))
        .max()
        .ok_or_else(|| anyhow!("payload contains no players"))?;
    let schema = crate::show::schema::schema_for_part_count(part_count)
        .ok_or_else(|| anyhow!("no costume schema with {} parts", part_count))?;

    let tracks = payload
        .players
        .iter()
        .map(|steps| {
            schema
                .parts
                .iter()
                .map(|name| part_column(steps, name, format, duration))
                .collect()
        })
        .collect();

    Ok(Show {
        schema,
        duration,
        tracks,
    })
}

/// Extract one part's keyframe run from a dancer's step table and turn it
/// back into segments.
fn part_column(steps: &[MergedStep], name: &str, format: PackFormat, duration: u32) -> Vec<Segment> {
    let mut keyframes: Vec<Keyframe> = Vec::new();
    for step in steps {
        let Some(&word) = step.parts.get(name) else {
            continue;
        };
        let Some(time) = step.time.checked_mul(TICK_MS) else {
            warn!(
                "step time {} ticks is out of range for part \"{}\"; skipping",
                step.time, name
            );
            continue;
        };
        let (color, linear) = decode(word, format);
        let frame = if color == OFF {
            Keyframe::gap(time)
        } else {
            Keyframe {
                time,
                color,
                linear,
                empty: false,
            }
        };
        // repeated identical words add nothing
        if let Some(last) = keyframes.last() {
            if last.color == frame.color && last.linear == frame.linear && last.empty == frame.empty
            {
                continue;
            }
        }
        keyframes.push(frame);
    }
    if keyframes.is_empty() {
        warn!("part \"{}\" has no steps; leaving it off", name);
    }
    keyframes_to_segments(&keyframes, duration)
}

const DEMO_PALETTE: [Rgba; 6] = [
    Rgba {
        r: 255,
        g: 0,
        b: 0,
        a: 1.0,
    },
    Rgba {
        r: 0,
        g: 255,
        b: 0,
        a: 1.0,
    },
    Rgba {
        r: 0,
        g: 0,
        b: 255,
        a: 1.0,
    },
    Rgba {
        r: 255,
        g: 200,
        b: 0,
        a: 1.0,
    },
    Rgba {
        r: 0,
        g: 255,
        b: 255,
        a: 0.5,
    },
    Rgba {
        r: 255,
        g: 0,
        b: 255,
        a: 0.75,
    },
];

/// Throwaway choreography for demos and soak tests: random blocks with
/// random gaps, everything on the grid.
pub fn random_show(schema: Schema, duration: u32, seed: Option<u64>) -> Show {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let tracks = (0..DANCER_COUNT)
        .map(|_| {
            (0..schema.part_count())
                .map(|_| {
                    let mut seq = Vec::new();
                    let mut t = 0;
                    while t + 500 < duration {
                        let len = quantize(rng.gen_range(500..4000)).min(duration - t);
                        let color = DEMO_PALETTE[rng.gen_range(0..DEMO_PALETTE.len())];
                        let mut segment = Segment::new(t, t + len, color);
                        segment.linear = rng.gen_range(0..2);
                        seq.push(segment);
                        t += len;
                        if rng.gen_bool(0.3) {
                            t += quantize(rng.gen_range(200..2000));
                        }
                    }
                    seq
                })
                .collect()
        })
        .collect();

    Show {
        schema,
        duration,
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::quantize_alpha;
    use crate::color::BLACK;
    use crate::show::schema::schema_for_part_count;
    use crate::timeline::is_valid;
    use pretty_assertions::assert_eq;

    const DURATION: u32 = 20_000;

    fn small_show() -> Show {
        let mut show = Show::blank(schema_for_part_count(9).unwrap(), DURATION);
        let mut fading = Segment::new(0, 4000, Rgba::new(255, 0, 0, 0.5));
        fading.linear = 1;
        show.set_part(
            0,
            0,
            vec![fading, Segment::new(6000, 9000, Rgba::new(0, 255, 0, 1.0))],
        );
        show
    }

    fn quantized(show: &Show) -> Show {
        let mut q = show.clone();
        for parts in &mut q.tracks {
            for seq in parts {
                for s in seq.iter_mut() {
                    s.color.a = quantize_alpha(s.color.a);
                }
            }
        }
        q
    }

    #[test]
    fn export_times_are_ticks_over_merged_boundaries() {
        let payload = hardware_table(&small_show());
        let steps = &payload.players[0];
        let times: Vec<u32> = steps.iter().map(|s| s.time).collect();
        // boundaries of part 0 (0, 4000, 6000, 9000) merged with the
        // all-black remaining parts (0, 20000), in ticks
        assert_eq!(times, vec![0, 80, 120, 180, 400]);
        assert_eq!(payload.pack_format, Some(PackFormat::AlphaLinear));
        // dense rows: every part at every step
        for step in steps {
            assert_eq!(step.parts.len(), 9);
        }
    }

    #[test]
    fn export_then_import_round_trips_up_to_alpha_precision() {
        let show = small_show();
        let payload = hardware_table(&show);
        let restored = import_players(&payload, DURATION).unwrap();
        assert_eq!(restored, quantized(&show));
    }

    #[test]
    fn sparse_steps_carry_the_previous_word_forward() {
        let mut first = IndexMap::new();
        for name in &schema_for_part_count(9).unwrap().parts {
            first.insert(name.clone(), encode(&Rgba::new(255, 0, 0, 1.0), 0));
        }
        let mut second = IndexMap::new();
        // only the hat changes at t=100 ticks
        second.insert(String::from("hat"), encode(&Rgba::new(0, 0, 255, 1.0), 0));

        let payload = PlayersPayload {
            pack_format: Some(PackFormat::AlphaLinear),
            players: vec![vec![
                MergedStep {
                    time: 0,
                    parts: first,
                },
                MergedStep {
                    time: 100,
                    parts: second,
                },
            ]],
        };
        let show = import_players(&payload, DURATION).unwrap();

        let hat = show.part(0, 0).unwrap();
        assert_eq!(hat.len(), 2);
        assert_eq!(hat[0].end_time, 5000);
        // every other part runs red for the whole track
        let chest = show.part(0, 3).unwrap();
        assert_eq!(chest.len(), 1);
        assert_eq!(chest[0].end_time, DURATION);
    }

    #[test]
    fn overflowing_step_times_are_skipped() {
        let mut first = IndexMap::new();
        let mut bogus = IndexMap::new();
        for name in &schema_for_part_count(9).unwrap().parts {
            first.insert(name.clone(), encode(&Rgba::new(255, 0, 0, 1.0), 0));
            bogus.insert(name.clone(), encode(&Rgba::new(0, 0, 255, 1.0), 0));
        }
        let payload = PlayersPayload {
            pack_format: Some(PackFormat::AlphaLinear),
            players: vec![vec![
                MergedStep {
                    time: 0,
                    parts: first,
                },
                MergedStep {
                    time: u32::MAX,
                    parts: bogus,
                },
            ]],
        };
        let show = import_players(&payload, DURATION).unwrap();
        let seq = show.part(0, 0).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].end_time, DURATION);
        assert!(is_valid(seq, DURATION));
    }

    #[test]
    fn missing_format_marker_means_percent_words() {
        let mut parts = IndexMap::new();
        for name in &schema_for_part_count(9).unwrap().parts {
            // legacy word: black at 100% brightness
            parts.insert(name.clone(), 100);
        }
        let payload = PlayersPayload {
            pack_format: None,
            players: vec![vec![MergedStep { time: 0, parts }]],
        };
        let show = import_players(&payload, DURATION).unwrap();
        let seq = show.part(0, 0).unwrap();
        assert_eq!(seq[0].color, BLACK);
    }

    #[test]
    fn gaps_survive_the_controller_format() {
        let mut show = Show::blank(schema_for_part_count(9).unwrap(), DURATION);
        show.set_part(
            0,
            0,
            vec![
                Segment::new(0, 2000, Rgba::new(255, 0, 0, 1.0)),
                Segment::new(5000, 8000, Rgba::new(255, 0, 0, 1.0)),
            ],
        );
        let restored = import_players(&hardware_table(&show), DURATION).unwrap();
        assert_eq!(restored.part(0, 0).unwrap(), &quantized(&show).tracks[0][0]);
    }

    #[test]
    fn random_show_is_on_grid_and_valid() {
        let show = random_show(schema_for_part_count(14).unwrap(), DURATION, Some(7));
        for parts in &show.tracks {
            for seq in parts {
                assert!(is_valid(seq, DURATION));
                for s in seq {
                    assert_eq!(s.start_time % TICK_MS, 0);
                    assert_eq!(s.end_time % TICK_MS, 0);
                }
            }
        }
        // same seed, same show
        assert_eq!(
            show,
            random_show(schema_for_part_count(14).unwrap(), DURATION, Some(7))
        );
    }
}
