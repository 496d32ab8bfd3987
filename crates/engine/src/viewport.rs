/// Overscan rows rendered beyond each edge of the visible window, so fast
/// scrolling does not flash blank rows before the next plan lands.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Inclusive range of display indices to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: usize,
    pub last: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.first..=self.last
    }
}

/// Prefix-sum offset table over display-row heights.
///
/// `offsets[i]` is the top edge of display row `i`; the final entry is the
/// total scrollable height. Rebuilt whole whenever the display sequence
/// shape changes (rows enter or leave, group headers appear or move);
/// lookups are binary searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOffsets {
    offsets: Vec<u32>,
}

impl RowOffsets {
    pub fn from_heights(heights: impl IntoIterator<Item = u32>) -> Self {
        let mut offsets = vec![0];
        let mut y = 0u32;
        for h in heights {
            y = y.saturating_add(h);
            offsets.push(y);
        }
        Self { offsets }
    }

    /// Fast path for a run of fixed-height rows.
    pub fn uniform(count: usize, height: u32) -> Self {
        let mut offsets = Vec::with_capacity(count + 1);
        for i in 0..=count as u32 {
            offsets.push(i * height);
        }
        Self { offsets }
    }

    /// Number of display rows covered.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_height(&self) -> u32 {
        *self.offsets.last().unwrap_or(&0)
    }

    pub fn top_of(&self, index: usize) -> u32 {
        self.offsets[index]
    }

    pub fn height_of(&self, index: usize) -> u32 {
        self.offsets[index + 1] - self.offsets[index]
    }

    /// Display index containing the vertical position `y`, clamped to the
    /// last row for positions at or past the bottom.
    pub fn index_at(&self, y: u32) -> usize {
        let n = self.len();
        debug_assert!(n > 0, "index_at on empty offsets");
        if y >= self.total_height() {
            return n - 1;
        }
        self.offsets.partition_point(|&top| top <= y) - 1
    }
}

/// The window to materialize for the given scroll position: the visible
/// index range `[index_at(scroll), index_at(scroll + container)]` widened
/// by `overscan` on both sides and clamped to `[0, n-1]`. Pure; `None`
/// when there are no display rows.
pub fn plan_range(
    offsets: &RowOffsets,
    scroll: u32,
    container: u32,
    overscan: usize,
) -> Option<RowRange> {
    let n = offsets.len();
    if n == 0 {
        return None;
    }
    let first_visible = offsets.index_at(scroll);
    let last_visible = offsets.index_at(scroll.saturating_add(container));
    Some(RowRange {
        first: first_visible.saturating_sub(overscan),
        last: (last_visible + overscan).min(n - 1),
    })
}

/// Stateful planner over [`plan_range`].
///
/// Holds the latest offsets, scroll position, and container height, plus
/// the last planned range so callers can diff consecutive plans. Nothing
/// else is cached: every plan derives from current state.
#[derive(Debug, Default)]
pub struct Viewport {
    overscan: usize,
    scroll_offset: u32,
    container_height: u32,
    offsets: RowOffsets,
    last_range: Option<RowRange>,
}

impl Viewport {
    pub fn new(container_height: u32, overscan: usize) -> Self {
        Self {
            overscan,
            scroll_offset: 0,
            container_height,
            offsets: RowOffsets::default(),
            last_range: None,
        }
    }

    /// Install freshly rebuilt offsets (display shape changed) and clamp
    /// the scroll position to the new content height.
    pub fn set_offsets(&mut self, offsets: RowOffsets) {
        self.offsets = offsets;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn scroll_to(&mut self, offset: u32) {
        self.scroll_offset = offset.min(self.max_scroll());
    }

    pub fn resize(&mut self, container_height: u32) {
        self.container_height = container_height;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn total_height(&self) -> u32 {
        self.offsets.total_height()
    }

    fn max_scroll(&self) -> u32 {
        self.offsets.total_height().saturating_sub(self.container_height)
    }

    /// Recompute the materialized range. Returns the range plus whether it
    /// differs from the previous plan.
    pub fn plan(&mut self) -> (Option<RowRange>, bool) {
        let range = plan_range(
            &self.offsets,
            self.scroll_offset,
            self.container_height,
            self.overscan,
        );
        let changed = range != self.last_range;
        self.last_range = range;
        (range, changed)
    }

    /// The last planned range, if any.
    pub fn range(&self) -> Option<RowRange> {
        self.last_range
    }
}
