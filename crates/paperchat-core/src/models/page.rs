use serde::{Deserialize, Serialize};

/// One extracted PDF page. Page numbers are 1-based, matching PDF viewers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentPage {
    pub page_number: u32,
    pub content: String,
}
