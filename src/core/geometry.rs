use serde::{Deserialize, Serialize};

/// Horizontal strip `[start, end)` of a sheet, in pixel rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Band {
    pub start: u32,
    pub end: u32,
}

impl Band {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn whole(height: u32) -> Self {
        Self::new(0, height)
    }

    pub fn height(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Equal split of `height` rows into `count` bands; the last band absorbs the remainder.
pub fn equal_bands(height: u32, count: u32) -> Vec<Band> {
    if height == 0 || count == 0 {
        return Vec::new();
    }
    if height < count {
        return vec![Band::whole(height)];
    }

    let step = height / count;
    (0..count)
        .map(|i| {
            let start = i * step;
            let end = if i + 1 < count { start + step } else { height };
            Band::new(start, end)
        })
        .collect()
}
