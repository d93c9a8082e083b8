use log::{info, warn};

use crate::color::Rgba;
use crate::history::History;
use crate::playback::Playback;
use crate::show::Show;
use crate::timeline::{self, Segment};

/// A single selected block, addressed by track and position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    pub dancer: usize,
    pub part: usize,
    pub index: usize,
}

/// A copied part sequence, pasteable onto any track.
#[derive(Clone, Debug)]
pub struct Clipboard {
    pub segments: Vec<Segment>,
    pub source_dancer: usize,
    pub source_part: usize,
}

struct DragState {
    dancer: usize,
    part: usize,
    /// Position of the dragged block in the pre-drag sequence; the live
    /// selection may change mid-gesture without retargeting the drag.
    index: usize,
    /// The whole show as it was when the gesture started; previews are
    /// derived from this, and commit snapshots it once.
    before: Show,
}

/// Editor state: the show plus everything around it (history, playhead,
/// selection, clipboard, colour palette, in-flight drag).
pub struct Model {
    pub show: Show,
    pub history: History,
    pub playback: Playback,
    pub selection: Option<Selection>,
    pub clipboard: Option<Clipboard>,
    pub chosen_color: Rgba,
    pub favorites: Vec<Rgba>,
    drag: Option<DragState>,
}

impl Model {
    pub fn new(show: Show) -> Model {
        let playback = Playback::new(show.duration);
        Model {
            show,
            history: History::new(),
            playback,
            selection: None,
            chosen_color: Rgba::new(255, 0, 0, 1.0),
            favorites: Vec::new(),
            clipboard: None,
            drag: None,
        }
    }

    pub fn select(&mut self, dancer: usize, part: usize, index: usize) {
        match self.show.part(dancer, part) {
            Some(seq) if index < seq.len() => {
                self.selection = Some(Selection {
                    dancer,
                    part,
                    index,
                })
            }
            _ => {
                warn!(
                    "cannot select block {} on dancer {} part {}",
                    index, dancer, part
                );
                self.selection = None;
            }
        }
    }

    pub fn selected_segment(&self) -> Option<&Segment> {
        let sel = self.selection?;
        self.show.part(sel.dancer, sel.part)?.get(sel.index)
    }

    /// Run a timeline operation against the selected block's sequence and
    /// commit the result. Returns the rebuilt sequence's length, or None
    /// when the operation declined.
    fn edit_selected(
        &mut self,
        f: impl FnOnce(&[Segment], usize) -> Option<Vec<Segment>>,
    ) -> Option<usize> {
        let sel = self.selection?;
        let seq = self.show.part(sel.dancer, sel.part)?;
        let new_seq = f(seq, sel.index)?;
        let len = new_seq.len();
        self.history.snapshot(&self.show);
        self.show.set_part(sel.dancer, sel.part, new_seq);
        Some(len)
    }

    /// Drop a block of the chosen colour at the playhead on the given
    /// track, or recolour the block already under it. The affected block
    /// becomes the selection.
    pub fn insert_at_playhead(&mut self, dancer: usize, part: usize) -> bool {
        let t = self.playback.position();
        let color = self.chosen_color;
        let duration = self.show.duration;
        let Some(seq) = self.show.part(dancer, part) else {
            warn!("no such track: dancer {} part {}", dancer, part);
            return false;
        };
        let Some(new_seq) = timeline::insert_or_update(seq, t, duration, color) else {
            return false;
        };
        let index = new_seq.iter().position(|s| s.contains(t));
        self.history.snapshot(&self.show);
        self.show.set_part(dancer, part, new_seq);
        if let Some(index) = index {
            self.select(dancer, part, index);
        }
        true
    }

    pub fn recolor_selected(&mut self, color: Rgba) -> bool {
        self.edit_selected(|seq, index| {
            let mut out = seq.to_vec();
            out.get_mut(index)?.color = color;
            Some(out)
        })
        .is_some()
    }

    pub fn set_favorite(&mut self, slot: usize, color: Rgba) {
        if slot >= self.favorites.len() {
            self.favorites.resize(slot + 1, color);
        }
        self.favorites[slot] = color;
    }

    pub fn apply_favorite(&mut self, slot: usize) -> bool {
        let Some(&color) = self.favorites.get(slot) else {
            warn!("no favourite colour in slot {}", slot);
            return false;
        };
        self.recolor_selected(color)
    }

    /// Delete the selected block, leaving a gap. Nothing remains selected.
    pub fn delete_selected(&mut self) -> bool {
        if self
            .edit_selected(|seq, index| timeline::delete(seq, index))
            .is_some()
        {
            self.selection = None;
            true
        } else {
            false
        }
    }

    /// Split the selected block at the playhead; the right half becomes
    /// the selection.
    pub fn cut_selected_at_playhead(&mut self) -> bool {
        let at = self.playback.position();
        let sel = self.selection;
        if self
            .edit_selected(|seq, index| timeline::cut(seq, index, at))
            .is_some()
        {
            if let Some(sel) = sel {
                self.select(sel.dancer, sel.part, sel.index + 1);
            }
            true
        } else {
            false
        }
    }

    /// Merge the selected block with its contiguous right neighbour; the
    /// merged block keeps the selection.
    pub fn merge_selected_with_next(&mut self) -> bool {
        self.edit_selected(|seq, index| timeline::merge_with_next(seq, index))
            .is_some()
    }

    pub fn toggle_linear_selected(&mut self) -> bool {
        self.edit_selected(|seq, index| timeline::toggle_linear(seq, index))
            .is_some()
    }

    pub fn set_brightness_selected(&mut self, alpha: f32) -> bool {
        self.edit_selected(|seq, index| timeline::set_brightness(seq, index, alpha))
            .is_some()
    }

    /// Repaint the run of blocks from the selection onward with a
    /// brightness ramp.
    pub fn gradient_fill_selected(&mut self, start_pct: i32, step_pct: i32, end_pct: i32) -> bool {
        self.edit_selected(|seq, index| {
            timeline::gradient_fill(seq, index, start_pct, step_pct, end_pct)
        })
        .is_some()
    }

    /// Copy the selected track's whole sequence.
    pub fn copy_selected_part(&mut self) -> bool {
        let Some(sel) = self.selection else {
            warn!("copy with nothing selected");
            return false;
        };
        let Some(seq) = self.show.part(sel.dancer, sel.part) else {
            return false;
        };
        info!(
            "copied {} blocks from dancer {} part {}",
            seq.len(),
            sel.dancer,
            sel.part
        );
        self.clipboard = Some(Clipboard {
            segments: seq.clone(),
            source_dancer: sel.dancer,
            source_part: sel.part,
        });
        true
    }

    /// Replace the selected track's sequence with the clipboard contents;
    /// the first pasted block becomes the selection.
    pub fn paste_into_selected_part(&mut self) -> bool {
        let Some(sel) = self.selection else {
            warn!("paste with nothing selected");
            return false;
        };
        let Some(clip) = self.clipboard.clone() else {
            warn!("paste with empty clipboard");
            return false;
        };
        self.history.snapshot(&self.show);
        self.show.set_part(sel.dancer, sel.part, clip.segments);
        self.select(sel.dancer, sel.part, 0);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.show) {
            Some(previous) => {
                self.show = previous;
                self.selection = None;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.show) {
            Some(next) => {
                self.show = next;
                self.selection = None;
                true
            }
            None => false,
        }
    }

    /// Start a drag gesture on the selected block. Previews mutate the
    /// live show; history is untouched until [`Model::commit_drag`].
    pub fn begin_drag(&mut self) -> bool {
        let Some(sel) = self.selection else {
            warn!("drag with nothing selected");
            return false;
        };
        if self.drag.is_some() {
            warn!("drag already in progress");
            return false;
        }
        self.drag = Some(DragState {
            dancer: sel.dancer,
            part: sel.part,
            index: sel.index,
            before: self.show.clone(),
        });
        true
    }

    /// Preview the selected block at a new start time. Always derived from
    /// the pre-drag state, so stale previews never accumulate.
    pub fn preview_move(&mut self, new_start: u32) -> bool {
        self.preview(|seq, index, duration| {
            timeline::move_segment(seq, index, new_start, duration)
        })
    }

    pub fn preview_resize(&mut self, new_end: u32) -> bool {
        self.preview(|seq, index, duration| timeline::resize_right(seq, index, new_end, duration))
    }

    fn preview(
        &mut self,
        f: impl FnOnce(&[Segment], usize, u32) -> Option<Vec<Segment>>,
    ) -> bool {
        let Some(drag) = &self.drag else {
            warn!("preview outside a drag gesture");
            return false;
        };
        let duration = self.show.duration;
        let Some(seq) = drag.before.part(drag.dancer, drag.part) else {
            return false;
        };
        match f(seq, drag.index, duration) {
            Some(new_seq) => {
                let (dancer, part) = (drag.dancer, drag.part);
                self.show.set_part(dancer, part, new_seq);
                true
            }
            None => false,
        }
    }

    /// End the gesture. However many previews ran, the history gains at
    /// most one entry; a gesture that changed nothing gains none.
    pub fn commit_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            warn!("commit outside a drag gesture");
            return false;
        };
        if drag.before == self.show {
            return false;
        }
        self.history.snapshot(&drag.before);
        true
    }

    /// Abandon the gesture and restore the pre-drag state.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.show = drag.before;
        }
    }
}
