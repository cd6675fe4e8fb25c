use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_OFFSET: u32 = 0;
pub const DEFAULT_PAGE_MAX: u32 = 20;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub max: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: DEFAULT_PAGE_OFFSET,
            max: DEFAULT_PAGE_MAX,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// -1 when the service does not report a total.
    #[serde(default = "unknown_total")]
    pub total: i64,
}

impl<T> PageResult<T> {
    pub fn total_known(&self) -> Option<u64> {
        u64::try_from(self.total).ok()
    }
}

fn unknown_total() -> i64 {
    -1
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedItem {
    pub id: String,
    pub name: String,
    pub url: String,
}
