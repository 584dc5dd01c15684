//! Pagination metadata attached to every listing page

use serde::{Deserialize, Serialize};

/// Pagination block returned next to a page of items
///
/// Two constructors exist because providers differ: some report a true total
/// ([`Pagination::from_total`]), others only hand back a page and the total
/// has to be guessed from its length ([`Pagination::from_page_len`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

impl Pagination {
    /// Pagination for a provider that reported `total`
    pub fn from_total(total: u64, limit: u32, offset: u32, returned: usize) -> Self {
        let has_more = limit > 0 && (offset as u64 + returned as u64) < total;
        Self::build(total, limit, offset, has_more)
    }

    /// Heuristic pagination: a full page means there is probably another one
    pub fn from_page_len(limit: u32, offset: u32, returned: usize) -> Self {
        let has_more = limit > 0 && returned as u64 >= limit as u64;
        let mut total = offset as u64 + returned as u64;
        if has_more {
            total += limit as u64;
        }
        Self::build(total, limit, offset, has_more)
    }

    /// Uses the reported total when there is one, the heuristic otherwise
    pub fn resolve(total: Option<u64>, limit: u32, offset: u32, returned: usize) -> Self {
        match total {
            Some(total) => Self::from_total(total, limit, offset, returned),
            None => Self::from_page_len(limit, offset, returned),
        }
    }

    /// Pagination of an empty result, used by error envelopes
    pub fn empty(limit: u32, offset: u32) -> Self {
        Self::build(0, limit, offset, false)
    }

    fn build(total: u64, limit: u32, offset: u32, has_more: bool) -> Self {
        let (current_page, total_pages) = if limit == 0 {
            (1, 0)
        } else {
            let pages = total.div_ceil(limit as u64);
            (page_number(limit, offset), u32::try_from(pages).unwrap_or(u32::MAX))
        };

        Self {
            total,
            limit,
            offset,
            current_page,
            total_pages,
            has_more,
        }
    }
}

/// 1-based page holding `offset`, saturating at `u32::MAX`
pub(crate) fn page_number(limit: u32, offset: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    u32::try_from(offset as u64 / limit as u64 + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total() {
        let p = Pagination::from_total(5, 5, 0, 5);
        assert!(!p.has_more);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.total_pages, 1);

        let p = Pagination::from_total(101, 20, 40, 20);
        assert!(p.has_more);
        assert_eq!(p.current_page, 3);
        assert_eq!(p.total_pages, 6);
    }

    #[test]
    fn test_heuristic_full_page_announces_next() {
        let p = Pagination::from_page_len(10, 20, 10);
        assert!(p.has_more);
        assert_eq!(p.total, 40);
        assert_eq!(p.total_pages, 4);

        let p = Pagination::from_page_len(10, 20, 3);
        assert!(!p.has_more);
        assert_eq!(p.total, 23);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_zero_limit() {
        let p = Pagination::resolve(Some(50), 0, 10, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_more);

        let p = Pagination::from_page_len(0, 0, 0);
        assert!(!p.has_more);
        assert_eq!(p.total, 0);
    }

    #[test]
    fn test_last_offset_saturates() {
        let p = Pagination::from_page_len(1, u32::MAX, 0);
        assert_eq!(p.current_page, u32::MAX);
        assert!(!p.has_more);

        let p = Pagination::empty(2, u32::MAX);
        assert_eq!(p.current_page, u32::MAX / 2 + 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Pagination::empty(24, 0)).unwrap();
        assert_eq!(json["hasMore"], false);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 0);
    }
}
