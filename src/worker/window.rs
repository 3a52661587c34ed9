//! The visible index range and the traversal order derived from it.

/// Index range `[start, start + len)` that should be serviced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriorityWindow {
    pub start: usize,
    pub len: usize,
}

impl PriorityWindow {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Window covering page `page` (0-based) of `per_page` items.
    pub fn for_page(page: usize, per_page: usize) -> Self {
        Self::new(page.saturating_mul(per_page), per_page)
    }

    /// Number of pages needed for `total` items.
    pub fn page_count(total: usize, per_page: usize) -> usize {
        if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        }
    }

    pub fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Whether a delivered index still belongs to this window.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }

    /// Window clamped to a list of `total` items.
    pub fn clamp_to(&self, total: usize) -> std::ops::Range<usize> {
        let start = self.start.min(total);
        start..self.end().min(total)
    }
}

/// Traversal order for a walk over `total` items.
///
/// Indices inside the window come first, then every remaining index in
/// list order.
pub fn priority_order(total: usize, window: PriorityWindow) -> Vec<usize> {
    let hot = window.clamp_to(total);
    let mut order = Vec::with_capacity(total);
    order.extend(hot.clone());
    order.extend((0..total).filter(|i| !hot.contains(i)));
    order
}
