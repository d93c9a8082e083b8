use serde::{Deserialize, Serialize};
use tween::{Linear, Tweener};

/// An LED colour: 8-bit channels plus a brightness alpha in `[0,1]`.
///
/// Always passed by value; each timeline segment owns its own copy.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

pub const BLACK: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 1.0,
};

/// Transparent black, used for gap keyframes.
pub const OFF: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 0.0,
};

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    /// Alpha is ignored: a dim black is still black.
    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Euclidean distance over R,G,B, used to pick a selection highlight
    /// that contrasts with the block's own colour.
    pub fn distance(&self, other: &Rgba) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Linear interpolation from `self` towards `to`; channels round to the
    /// nearest integer, alpha stays continuous.
    pub fn lerp(&self, to: &Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: lerp_channel(self.r as f32, to.r as f32, t).round() as u8,
            g: lerp_channel(self.g as f32, to.g as f32, t).round() as u8,
            b: lerp_channel(self.b as f32, to.b as f32, t).round() as u8,
            a: lerp_channel(self.a, to.a, t),
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        BLACK
    }
}

fn lerp_channel(from: f32, to: f32, t: f32) -> f32 {
    Tweener::new(from, to, 1.0f32, Linear).move_to(t)
}
