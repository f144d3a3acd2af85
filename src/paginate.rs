/// One-based page cursor over a list whose length can change under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    current_page: usize,
    items_per_page: usize,
}

impl Paginator {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(len / items_per_page)`; zero for an empty list.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.items_per_page)
    }

    /// Index range of the current page, clipped to `len`.
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = (self.current_page - 1)
            .saturating_mul(self.items_per_page)
            .min(len);
        let end = self
            .current_page
            .saturating_mul(self.items_per_page)
            .min(len);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    /// Jump to `page`, clamped to `[1, max(total_pages, 1)]`.
    pub fn go_to(&mut self, page: usize, len: usize) {
        let last = self.total_pages(len).max(1);
        self.current_page = page.clamp(1, last);
    }

    pub fn next(&mut self, len: usize) {
        self.go_to(self.current_page + 1, len);
    }

    pub fn prev(&mut self, len: usize) {
        self.go_to(self.current_page.saturating_sub(1), len);
    }

    /// Call after the list changed; pulls the cursor back inside the new range.
    pub fn snap(&mut self, len: usize) {
        let last = self.total_pages(len).max(1);
        if self.current_page > last {
            self.current_page = last;
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(10)
    }
}
