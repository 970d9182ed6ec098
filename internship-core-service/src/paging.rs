use internship_core_api::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use internship_core_db::repository::PageRequest;

/// Page window from an optional 1-based page number and size.
pub fn page_request(page: Option<u32>, page_size: Option<u32>) -> PageRequest {
    let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    PageRequest::for_page(size as usize, page.unwrap_or(1) as usize)
}
