//! Interval sweep for the peak concurrent bandwidth weight of a set of rectangles.

use crate::foundation::core::Rect;

/// Rectangle with the weight it contributes while on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SweepItem {
    pub(crate) rect: Rect,
    pub(crate) weight: u32,
}

/// Begin or end marker of one item along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SweepEntry {
    key: u64,
    weight: i64,
    item: usize,
}

/// Scratch lists reused across sweeps. Both lists are empty between calls.
#[derive(Debug, Default)]
pub(crate) struct SweepArena {
    y: Vec<SweepEntry>,
    x: Vec<SweepEntry>,
}

impl SweepArena {
    /// Maximum concurrent weight of `items`.
    ///
    /// The Y sweep gives an upper bound; whenever the running sum exceeds both `lower_bound`
    /// and the best value so far, the Y-active subset is swept again along X for the exact
    /// figure.
    pub(crate) fn max_overlap(&mut self, items: &[SweepItem], lower_bound: u32) -> u32 {
        self.y.clear();
        self.x.clear();

        for (idx, item) in items.iter().enumerate() {
            if item.rect.is_empty() || item.weight == 0 {
                continue;
            }
            let (begin, end) = span(u64::from(item.rect.y), u64::from(item.rect.h));
            insert_entry(&mut self.y, begin, i64::from(item.weight), idx);
            insert_entry(&mut self.y, end, -i64::from(item.weight), idx);
        }

        let lower = i64::from(lower_bound);
        let mut sum = 0i64;
        let mut max = 0i64;
        for pos in 0..self.y.len() {
            let entry = self.y[pos];
            sum += entry.weight;
            if entry.weight > 0 {
                let rect = items[entry.item].rect;
                let (begin, end) = span(u64::from(rect.x), u64::from(rect.w));
                insert_entry(&mut self.x, begin, entry.weight, entry.item);
                insert_entry(&mut self.x, end, -entry.weight, entry.item);
            } else {
                self.x.retain(|e| e.item != entry.item);
            }

            let candidate = if sum > lower && sum > max {
                scan(&self.x)
            } else {
                sum
            };
            max = max.max(candidate);
        }

        self.y.clear();
        self.x.clear();
        u32::try_from(max).unwrap_or(u32::MAX)
    }
}

/// Inclusive `[offset, offset + size - 1]` keys.
fn span(offset: u64, size: u64) -> (u64, u64) {
    (offset, offset + size - 1)
}

/// Keep `list` sorted by key. A begin goes in front of every entry with the same key, an end
/// behind them, so a begin is counted before an end at the same position.
fn insert_entry(list: &mut Vec<SweepEntry>, key: u64, weight: i64, item: usize) {
    let pos = if weight > 0 {
        list.partition_point(|e| e.key < key)
    } else {
        list.partition_point(|e| e.key <= key)
    };
    list.insert(pos, SweepEntry { key, weight, item });
}

fn scan(list: &[SweepEntry]) -> i64 {
    let mut sum = 0i64;
    let mut max = 0i64;
    for entry in list {
        sum += entry.weight;
        max = max.max(sum);
    }
    max
}

#[cfg(test)]
#[path = "../../tests/unit/layering/sweep.rs"]
mod tests;
