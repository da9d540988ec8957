//! Page arithmetic for the note list.
//!
//! Pages are 1-based and always at least one page exists, even for an empty
//! list, so that clients can render "Page 1 of 1".

pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Row offset of the first note on `page`. Page 0 is treated as page 1.
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.max(1) - 1) * u64::from(self.page_size)
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        if total == 0 {
            return 1;
        }
        u32::try_from(total.div_ceil(u64::from(self.page_size))).unwrap_or(u32::MAX)
    }

    pub fn clamp(&self, page: u32, total_pages: u32) -> u32 {
        page.clamp(1, total_pages.max(1))
    }

    /// Page to show once a note has been deleted from `page` and `remaining`
    /// notes are left in total.
    pub fn page_after_delete(&self, page: u32, remaining: u64) -> u32 {
        self.clamp(page, self.total_pages(remaining))
    }
}
