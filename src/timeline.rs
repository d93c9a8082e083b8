use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::{Rgba, OFF};
use crate::settings::{DEFAULT_BLOCK_MS, MIN_BLOCK_MS, TICK_MS};

/// One coloured block on a part's timeline: `[start_time, end_time)` in ms.
///
/// A part's timeline is a Vec of these, sorted by `start_time` with no
/// overlap and every block at least `MIN_BLOCK_MS` wide. Gaps between
/// blocks render as off/black and are never materialised here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_time: u32,
    pub end_time: u32,
    pub color: Rgba,
    /// 1 = fade towards the next block's colour over this block's span
    #[serde(default)]
    pub linear: u8,
}

impl Segment {
    pub fn new(start_time: u32, end_time: u32, color: Rgba) -> Self {
        Segment {
            start_time,
            end_time,
            color,
            linear: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, t: u32) -> bool {
        self.start_time <= t && t < self.end_time
    }
}

/// Snap a time down onto the 50 ms grid.
pub fn quantize(t: u32) -> u32 {
    t / TICK_MS * TICK_MS
}

/// Resolve the colour of a part at time `t`.
///
/// Constant blocks return their own colour; fade blocks interpolate
/// towards the next block in the sequence (or transparent black if it is
/// the last one). Gaps resolve to transparent black. Preview and export
/// both go through here so they can never disagree.
pub fn evaluate(seq: &[Segment], t: u32) -> Rgba {
    let Some(index) = seq.iter().position(|s| s.contains(t)) else {
        return OFF;
    };
    let segment = &seq[index];
    if segment.linear == 0 {
        return segment.color;
    }
    let target = seq.get(index + 1).map(|next| next.color).unwrap_or(OFF);
    let progress = (t - segment.start_time) as f32 / segment.width() as f32;
    segment.color.lerp(&target, progress)
}

/// Paint at the playhead: recolour the block containing `t`, or create a
/// new block of up to `DEFAULT_BLOCK_MS`, shortened so it cannot overlap
/// the next block. `t` must already be quantized.
///
/// Returns `None` (sequence untouched) if there is no room for a block of
/// minimum width.
pub fn insert_or_update(seq: &[Segment], t: u32, duration: u32, color: Rgba) -> Option<Vec<Segment>> {
    let mut out = seq.to_vec();

    if let Some(existing) = out.iter_mut().find(|s| s.contains(t)) {
        existing.color = color;
        return Some(out);
    }

    let mut end_time = (t + DEFAULT_BLOCK_MS).min(duration);
    if let Some(next) = out.iter().find(|s| s.start_time > t) {
        end_time = end_time.min(next.start_time);
    }
    if end_time < t + MIN_BLOCK_MS {
        warn!("no room for a new block at {}ms", t);
        return None;
    }

    let insert_at = out
        .iter()
        .position(|s| s.start_time > t)
        .unwrap_or(out.len());
    out.insert(insert_at, Segment::new(t, end_time, color));
    Some(out)
}

/// Slide a block to `new_start`, width preserved. The target is clamped
/// so the block keeps a grid-step gap from both neighbours and stays
/// inside `[0, duration]`; if the neighbours leave no legal position the
/// move is rejected.
pub fn move_segment(
    seq: &[Segment],
    index: usize,
    new_start: u32,
    duration: u32,
) -> Option<Vec<Segment>> {
    let segment = seq.get(index)?;
    let width = segment.width();

    let lo = match index.checked_sub(1).and_then(|i| seq.get(i)) {
        Some(prev) => prev.end_time + MIN_BLOCK_MS,
        None => 0,
    };
    let mut hi = duration.checked_sub(width)?;
    if let Some(next) = seq.get(index + 1) {
        hi = hi.min(next.start_time.checked_sub(width + MIN_BLOCK_MS)?);
    }
    if hi < lo {
        warn!("block {} is pinned by its neighbours; move rejected", index);
        return None;
    }

    let start = new_start.clamp(lo, hi);
    let mut out = seq.to_vec();
    out[index].start_time = start;
    out[index].end_time = start + width;
    Some(out)
}

/// Drag the right edge of a block to `new_end`. Every later block is
/// shifted by the same delta (a ripple) so widths stay constant and no
/// overlap can appear; blocks pushed past `duration` keep their shifted
/// start, shrink against the track end, and are dropped once squeezed
/// below minimum width.
pub fn resize_right(
    seq: &[Segment],
    index: usize,
    new_end: u32,
    duration: u32,
) -> Option<Vec<Segment>> {
    let segment = seq.get(index)?;
    if new_end < segment.start_time + MIN_BLOCK_MS || new_end > duration {
        warn!(
            "resize to {}ms rejected for block {} ({}..{})",
            new_end, index, segment.start_time, segment.end_time
        );
        return None;
    }

    let delta = new_end as i64 - segment.end_time as i64;
    let mut out = Vec::with_capacity(seq.len());
    out.extend_from_slice(&seq[..index]);

    let mut resized = segment.clone();
    resized.end_time = new_end;
    out.push(resized);

    for s in &seq[index + 1..] {
        let start = (s.start_time as i64 + delta) as u32;
        let end = ((s.end_time as i64 + delta) as u32).min(duration);
        if end < start + MIN_BLOCK_MS {
            warn!(
                "block {}..{} squeezed out past track end; dropping",
                s.start_time, s.end_time
            );
            continue;
        }
        out.push(Segment { start_time: start, end_time: end, ..s.clone() });
    }
    Some(out)
}

/// Split a block at `at` (quantized). Both halves keep the colour and
/// fade flag; each must end up at least a grid step wide.
pub fn cut(seq: &[Segment], index: usize, at: u32) -> Option<Vec<Segment>> {
    let segment = seq.get(index)?;
    if at <= segment.start_time || at >= segment.end_time {
        warn!(
            "cut point {}ms outside block {}..{}",
            at, segment.start_time, segment.end_time
        );
        return None;
    }
    if at - segment.start_time < MIN_BLOCK_MS || segment.end_time - at < MIN_BLOCK_MS {
        warn!("cut at {}ms would leave a sliver; rejected", at);
        return None;
    }

    let mut out = seq.to_vec();
    let mut right = out[index].clone();
    right.start_time = at;
    out[index].end_time = at;
    out.insert(index + 1, right);
    Some(out)
}

/// Merge a block with its successor. Only valid when the two are
/// contiguous (no gap); colours need not match and the first block's
/// colour wins.
pub fn merge_with_next(seq: &[Segment], index: usize) -> Option<Vec<Segment>> {
    let segment = seq.get(index)?;
    let next = seq.get(index + 1)?;
    if segment.end_time != next.start_time {
        warn!(
            "cannot merge across gap {}..{}",
            segment.end_time, next.start_time
        );
        return None;
    }
    let mut out = seq.to_vec();
    out[index].end_time = next.end_time;
    out.remove(index + 1);
    Some(out)
}

/// Remove a block outright; neighbours stay put and the span becomes a
/// gap (off/black).
pub fn delete(seq: &[Segment], index: usize) -> Option<Vec<Segment>> {
    if index >= seq.len() {
        return None;
    }
    let mut out = seq.to_vec();
    out.remove(index);
    Some(out)
}

/// Toggle the fade flag on one block.
pub fn toggle_linear(seq: &[Segment], index: usize) -> Option<Vec<Segment>> {
    let mut out = seq.to_vec();
    let segment = out.get_mut(index)?;
    segment.linear = if segment.linear == 1 { 0 } else { 1 };
    Some(out)
}

/// Set the brightness (alpha) of one block.
pub fn set_brightness(seq: &[Segment], index: usize, alpha: f32) -> Option<Vec<Segment>> {
    let mut out = seq.to_vec();
    out.get_mut(index)?.color.a = alpha;
    Some(out)
}

/// Ramp brightness across consecutive blocks starting at `start_index`:
/// each block gets `current/100`, stepping by `step_pct` towards
/// `end_pct` (direction inferred from the endpoints), stopping after the
/// endpoint is passed or the timeline runs out.
pub fn gradient_fill(
    seq: &[Segment],
    start_index: usize,
    start_pct: i32,
    step_pct: i32,
    end_pct: i32,
) -> Option<Vec<Segment>> {
    if start_index >= seq.len() || step_pct <= 0 {
        warn!("gradient fill rejected: bad start index or step");
        return None;
    }

    let mut out = seq.to_vec();
    let ascending = end_pct > start_pct;
    let mut current = start_pct;
    let mut index = start_index;
    while (ascending && current <= end_pct) || (!ascending && current >= end_pct) {
        let Some(segment) = out.get_mut(index) else {
            break;
        };
        segment.color.a = current as f32 / 100.0;
        current += if ascending { step_pct } else { -step_pct };
        index += 1;
    }
    Some(out)
}

/// Sanity check for the sequence invariants (sorted, non-overlapping,
/// minimum width, inside the track); editing operations are expected to
/// keep these true at every commit point.
pub fn is_valid(seq: &[Segment], duration: u32) -> bool {
    seq.windows(2).all(|w| w[0].end_time <= w[1].start_time)
        && seq
            .iter()
            .all(|s| s.width() >= MIN_BLOCK_MS && s.end_time <= duration)
}
