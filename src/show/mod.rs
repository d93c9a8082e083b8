use std::fs;

use anyhow::{anyhow, Context};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::codec::{keyframes_to_segments, segments_to_keyframes, Keyframe};
use crate::color::BLACK;
use crate::settings::DANCER_COUNT;
use crate::timeline::Segment;

use self::schema::{schema_for_part_count, Schema};

pub mod schema;

/// The whole choreography: one segment sequence per (dancer, part).
///
/// Mutated only by swapping in new part sequences produced by the pure
/// timeline operations; a `Show` is cheap to clone for history snapshots
/// and drag scratch copies.
#[derive(Clone, Debug, PartialEq)]
pub struct Show {
    pub schema: Schema,
    /// Track length in ms.
    pub duration: u32,
    /// Indexed `[dancer][part]`.
    pub tracks: Vec<Vec<Vec<Segment>>>,
}

/// On-disk/wire shape of a raw dump: the keyframe-form table, stringified
/// the way the original backend stores it.
#[derive(Serialize, Deserialize)]
pub struct RawDump {
    pub raw_data: String,
}

impl Show {
    /// Fresh show: every part holds a single black block spanning the
    /// whole track.
    pub fn blank(schema: Schema, duration: u32) -> Show {
        let tracks = (0..DANCER_COUNT)
            .map(|_| {
                (0..schema.part_count())
                    .map(|_| vec![Segment::new(0, duration, BLACK)])
                    .collect()
            })
            .collect();
        Show {
            schema,
            duration,
            tracks,
        }
    }

    pub fn dancer_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn part(&self, dancer: usize, part: usize) -> Option<&Vec<Segment>> {
        self.tracks.get(dancer)?.get(part)
    }

    /// Swap in a new sequence for one part, leaving every other part
    /// untouched.
    pub fn set_part(&mut self, dancer: usize, part: usize, seq: Vec<Segment>) {
        if let Some(slot) = self
            .tracks
            .get_mut(dancer)
            .and_then(|parts| parts.get_mut(part))
        {
            *slot = seq;
        } else {
            warn!("set_part out of range: dancer {} part {}", dancer, part);
        }
    }

    /// Serialise to the keyframe-form table (legacy codec per part),
    /// stringified for the `raw_data` payload.
    pub fn to_raw_dump(&self) -> anyhow::Result<RawDump> {
        let table: Vec<Vec<Vec<Keyframe>>> = self
            .tracks
            .iter()
            .map(|parts| {
                parts
                    .iter()
                    .map(|seq| segments_to_keyframes(seq, self.duration))
                    .collect()
            })
            .collect();
        Ok(RawDump {
            raw_data: serde_json::to_string(&table)?,
        })
    }

    /// Rebuild a show from a raw dump. The schema revision is recovered
    /// from the per-dancer part count; an unknown count is a hard error
    /// rather than a guess.
    pub fn from_raw_dump(dump: &RawDump, duration: u32) -> anyhow::Result<Show> {
        let table: Vec<Vec<Vec<Keyframe>>> =
            serde_json::from_str(&dump.raw_data).context("failed to parse raw_data table")?;

        let part_count = table
            .first()
            .map(|parts| parts.len())
            .ok_or_else(|| anyhow!("raw dump contains no dancers"))?;
        let schema = schema_for_part_count(part_count)
            .ok_or_else(|| anyhow!("no costume schema with {} parts", part_count))?;

        let tracks: Vec<Vec<Vec<Segment>>> = table
            .iter()
            .map(|parts| {
                parts
                    .iter()
                    .map(|keyframes| keyframes_to_segments(keyframes, duration))
                    .collect()
            })
            .collect();

        Ok(Show {
            schema,
            duration,
            tracks,
        })
    }

    pub fn load(path: &str, duration: u32) -> anyhow::Result<Show> {
        let text = fs::read_to_string(path);
        match text {
            Ok(d) => {
                info!("Found show {}; parsing...", &path);
                let dump = serde_json::from_str::<RawDump>(&d)
                    .with_context(|| format!("failed to parse show file {}", path))?;
                let show = Show::from_raw_dump(&dump, duration)?;
                info!(
                    "... loaded show with {} dancers x {} parts OK",
                    show.dancer_count(),
                    show.schema.part_count()
                );
                Ok(show)
            }
            Err(e) => {
                warn!("Failed to load show from disk: {:?}", e);
                Err(e.into())
            }
        }
    }

    pub fn save(path: &str, show: &Show) -> anyhow::Result<()> {
        let dump = show.to_raw_dump()?;
        let json = serde_json::to_string_pretty(&dump)?;
        fs::write(path, json)?;
        info!("Saved raw show dump to \"{}\" OK", &path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use pretty_assertions::assert_eq;

    const DURATION: u32 = 60_000;

    fn schema() -> Schema {
        schema_for_part_count(9).unwrap()
    }

    #[test]
    fn blank_show_is_all_black_full_span() {
        let show = Show::blank(schema(), DURATION);
        assert_eq!(show.dancer_count(), DANCER_COUNT);
        for dancer in 0..DANCER_COUNT {
            for part in 0..9 {
                let seq = show.part(dancer, part).unwrap();
                assert_eq!(seq.len(), 1);
                assert_eq!(seq[0], Segment::new(0, DURATION, BLACK));
            }
        }
    }

    #[test]
    fn raw_dump_round_trips_the_whole_table() {
        let mut show = Show::blank(schema(), DURATION);
        let red = Rgba::new(255, 0, 0, 1.0);
        show.set_part(
            2,
            4,
            vec![
                Segment::new(1000, 3000, red),
                Segment::new(4000, 9000, Rgba::new(0, 255, 0, 0.5)),
            ],
        );
        show.set_part(0, 0, vec![]);

        let dump = show.to_raw_dump().unwrap();
        let restored = Show::from_raw_dump(&dump, DURATION).unwrap();
        assert_eq!(restored, show);
    }

    #[test]
    fn unknown_part_count_is_rejected() {
        let table: Vec<Vec<Vec<Keyframe>>> = vec![vec![Vec::new(); 3]];
        let dump = RawDump {
            raw_data: serde_json::to_string(&table).unwrap(),
        };
        assert!(Show::from_raw_dump(&dump, DURATION).is_err());
    }

    #[test]
    fn empty_dump_is_rejected() {
        let dump = RawDump {
            raw_data: String::from("[]"),
        };
        assert!(Show::from_raw_dump(&dump, DURATION).is_err());
    }

    #[test]
    fn set_part_out_of_range_is_ignored() {
        let mut show = Show::blank(schema(), DURATION);
        let before = show.clone();
        show.set_part(99, 0, vec![]);
        assert_eq!(show, before);
    }
}
