use serde::Serialize;

/// Rows shown per page in every listing.
pub const PAGE_SIZE: usize = 10;

/// Number of pages needed for `total` rows.
pub fn total_pages(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Clamps a requested page number into `[1, max(total_pages, 1)]`.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total_pages(total).max(1))
}

/// One page of a listing plus the numbers needed to render navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

/// Slices `rows` to the requested page; out-of-range pages are clamped.
pub fn paginate<T: Clone>(rows: &[T], page: usize) -> Page<T> {
    let total_items = rows.len();
    let page = clamp_page(page, total_items);
    let start = (page - 1) * PAGE_SIZE;
    let items = rows.iter().skip(start).take(PAGE_SIZE).cloned().collect();

    Page {
        items,
        page,
        total_pages: total_pages(total_items),
        total_items,
    }
}
