use forecast::DisasterKind;
use serde::Serialize;

/// Visual encoding of one disaster kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct StyleEntry {
    /// Linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    pub opacity: f32,
    /// Lift of point markers above the unit globe, in globe radii.
    pub alt_offset: f64,
}

impl StyleEntry {
    pub const fn new(color: [f32; 3], opacity: f32, alt_offset: f64) -> Self {
        Self {
            color,
            opacity,
            alt_offset,
        }
    }

    /// Style from a packed `0xRRGGBB` color.
    pub const fn from_hex(rgb: u32, opacity: f32, alt_offset: f64) -> Self {
        Self::new(hex_to_rgb(rgb), opacity, alt_offset)
    }
}

pub const fn hex_to_rgb(rgb: u32) -> [f32; 3] {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    ]
}

pub const FIRES_STYLE: StyleEntry = StyleEntry::from_hex(0xff4500, 0.85, 0.02);
pub const FLOODS_STYLE: StyleEntry = StyleEntry::from_hex(0x1e90ff, 0.85, 0.015);
pub const LANDSLIDES_STYLE: StyleEntry = StyleEntry::from_hex(0x8b5a2b, 0.85, 0.025);

/// Per-kind styles. Built once at startup and never mutated.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct StyleTable {
    pub fires: StyleEntry,
    pub floods: StyleEntry,
    pub landslides: StyleEntry,
}

impl StyleTable {
    pub const DEFAULT: StyleTable = StyleTable {
        fires: FIRES_STYLE,
        floods: FLOODS_STYLE,
        landslides: LANDSLIDES_STYLE,
    };

    pub const fn get(&self, kind: DisasterKind) -> &StyleEntry {
        match kind {
            DisasterKind::Fires => &self.fires,
            DisasterKind::Floods => &self.floods,
            DisasterKind::Landslides => &self.landslides,
        }
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}
