use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::{Rgba, OFF};
use crate::timeline::Segment;

/// One timestamped colour change in the legacy/storage representation.
/// The colour holds from `time` until the next keyframe (or track end);
/// `empty` marks an explicit gap so that gaps survive the round trip.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub time: u32,
    pub color: Rgba,
    #[serde(default)]
    pub linear: u8,
    #[serde(default, skip_serializing_if = "is_false")]
    pub empty: bool,
}

fn is_false(b: &bool) -> bool {
    !b
}

impl Keyframe {
    pub fn gap(time: u32) -> Self {
        Keyframe {
            time,
            color: OFF,
            linear: 0,
            empty: true,
        }
    }
}

/// Expand a keyframe list into explicit blocks. `empty` keyframes are
/// skipped as blocks but still terminate the run before them. Input is
/// assumed sorted by time.
pub fn keyframes_to_segments(keyframes: &[Keyframe], duration: u32) -> Vec<Segment> {
    let mut out = Vec::new();
    for (i, k) in keyframes.iter().enumerate() {
        if k.empty {
            continue;
        }
        let end_time = keyframes.get(i + 1).map(|next| next.time).unwrap_or(duration);
        out.push(Segment {
            start_time: k.time,
            end_time,
            color: k.color,
            linear: k.linear,
        });
    }
    debug!(
        "keyframes -> segments: {} -> {} entries",
        keyframes.len(),
        out.len()
    );
    out
}

/// Collapse blocks back to the keyframe list, inserting an explicit gap
/// keyframe wherever a block ends before the next one (or the track)
/// begins. Inverse of [`keyframes_to_segments`] for any valid sequence.
pub fn segments_to_keyframes(segments: &[Segment], duration: u32) -> Vec<Keyframe> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|s| s.start_time);

    let mut out = Vec::new();
    for (i, s) in sorted.iter().enumerate() {
        out.push(Keyframe {
            time: s.start_time,
            color: s.color,
            linear: s.linear,
            empty: false,
        });
        let next_start = sorted.get(i + 1).map(|n| n.start_time).unwrap_or(duration);
        if s.end_time < next_start {
            out.push(Keyframe::gap(s.end_time));
        }
    }
    out
}

/// The two generations of the packed low byte.
///
/// Only [`PackFormat::AlphaLinear`] is written; the plain alpha-percent
/// byte is accepted on decode for old dumps with no format marker.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PackFormat {
    /// Low byte is `round(alpha * 100)`; no fade flag.
    #[default]
    AlphaPercent,
    /// Low byte is a 7-bit alpha magnitude (steps of 1/128) plus the fade
    /// flag in bit 0.
    AlphaLinear,
}

/// Quantize an alpha onto the representable grid of the current scheme.
/// 1.0 lands on 127/128, the brightest encodable step.
pub fn quantize_alpha(a: f32) -> f32 {
    pack_alpha(a) as f32 / 128.0
}

fn pack_alpha(a: f32) -> u32 {
    ((a.clamp(0.0, 1.0) * 128.0).round() as u32).min(0x7f)
}

/// Pack a resolved colour and fade flag into the 32-bit hardware word:
/// `[R:8][G:8][B:8][pack:8]`.
pub fn encode(color: &Rgba, linear: u8) -> u32 {
    let pack = (pack_alpha(color.a) << 1) | (linear as u32 & 1);
    ((color.r as u32) << 24) | ((color.g as u32) << 16) | ((color.b as u32) << 8) | pack
}

/// Inverse of [`encode`], honouring both low-byte generations.
pub fn decode(word: u32, format: PackFormat) -> (Rgba, u8) {
    let r = ((word >> 24) & 0xff) as u8;
    let g = ((word >> 16) & 0xff) as u8;
    let b = ((word >> 8) & 0xff) as u8;
    let pack = word & 0xff;
    match format {
        PackFormat::AlphaPercent => (Rgba::new(r, g, b, pack as f32 / 100.0), 0),
        PackFormat::AlphaLinear => {
            let a = ((pack >> 1) & 0x7f) as f32 / 128.0;
            (Rgba::new(r, g, b, a), (pack & 1) as u8)
        }
    }
}
