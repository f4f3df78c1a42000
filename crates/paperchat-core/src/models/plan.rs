use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;

/// Subscription tier. The catalog is looked up by tier name, matching the
/// billing side's plan table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanTier {
    Free,
    Pro,
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PlanTier::Free => write!(f, "Free"),
            PlanTier::Pro => write!(f, "Pro"),
        }
    }
}

/// Per-tier ceilings applied during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanLimits {
    pub tier: PlanTier,
    pub name: String,
    pub pages_per_pdf: u32,
    pub max_file_size_bytes: usize,
}

/// A user's resolved subscription, as reported by the billing collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub tier: PlanTier,
    pub is_subscribed: bool,
}

impl SubscriptionPlan {
    pub fn free() -> Self {
        SubscriptionPlan {
            tier: PlanTier::Free,
            is_subscribed: false,
        }
    }
}

/// The plan table consumed by the ingestion workflow. Read-only here;
/// ceilings come from configuration.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<PlanLimits>,
}

impl PlanCatalog {
    pub fn new(
        free_pages_per_pdf: u32,
        free_max_file_size_bytes: usize,
        pro_pages_per_pdf: u32,
        pro_max_file_size_bytes: usize,
    ) -> Self {
        PlanCatalog {
            plans: vec![
                PlanLimits {
                    tier: PlanTier::Free,
                    name: "Free".to_string(),
                    pages_per_pdf: free_pages_per_pdf,
                    max_file_size_bytes: free_max_file_size_bytes,
                },
                PlanLimits {
                    tier: PlanTier::Pro,
                    name: "Pro".to_string(),
                    pages_per_pdf: pro_pages_per_pdf,
                    max_file_size_bytes: pro_max_file_size_bytes,
                },
            ],
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&PlanLimits> {
        self.plans.iter().find(|p| p.name == name)
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        PlanCatalog::new(5, 4 * 1024 * 1024, 25, 16 * 1024 * 1024)
    }
}

/// Page-count policy for ingestion: a subscribed user is held to the Pro
/// ceiling, everyone else to the Free ceiling. Returns the violated limit
/// when the document is over it.
pub fn exceeds_page_limit(
    catalog: &PlanCatalog,
    subscription: &SubscriptionPlan,
    pages: u32,
) -> Result<Option<u32>, AppError> {
    let pro = catalog
        .by_name("Pro")
        .ok_or_else(|| AppError::Internal("Plan catalog is missing the Pro tier".to_string()))?;
    let free = catalog
        .by_name("Free")
        .ok_or_else(|| AppError::Internal("Plan catalog is missing the Free tier".to_string()))?;

    let pro_exceeded = pages > pro.pages_per_pdf;
    let free_exceeded = pages > free.pages_per_pdf;

    if subscription.is_subscribed && pro_exceeded {
        Ok(Some(pro.pages_per_pdf))
    } else if !subscription.is_subscribed && free_exceeded {
        Ok(Some(free.pages_per_pdf))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PlanCatalog {
        PlanCatalog::new(5, 4 * 1024 * 1024, 25, 16 * 1024 * 1024)
    }

    fn subscribed() -> SubscriptionPlan {
        SubscriptionPlan {
            tier: PlanTier::Pro,
            is_subscribed: true,
        }
    }

    #[test]
    fn test_catalog_lookup_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.by_name("Free").unwrap().pages_per_pdf, 5);
        assert_eq!(catalog.by_name("Pro").unwrap().pages_per_pdf, 25);
        assert!(catalog.by_name("Enterprise").is_none());
    }

    #[test]
    fn test_unsubscribed_within_free_ceiling() {
        let result = exceeds_page_limit(&catalog(), &SubscriptionPlan::free(), 3).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_unsubscribed_over_free_ceiling() {
        let result = exceeds_page_limit(&catalog(), &SubscriptionPlan::free(), 10).unwrap();
        assert_eq!(result, Some(5));
    }

    #[test]
    fn test_subscribed_uses_pro_ceiling() {
        // 10 pages is over Free but under Pro
        let result = exceeds_page_limit(&catalog(), &subscribed(), 10).unwrap();
        assert_eq!(result, None);

        let result = exceeds_page_limit(&catalog(), &subscribed(), 26).unwrap();
        assert_eq!(result, Some(25));
    }

    #[test]
    fn test_exactly_at_ceiling_is_allowed() {
        let result = exceeds_page_limit(&catalog(), &SubscriptionPlan::free(), 5).unwrap();
        assert_eq!(result, None);
    }
}
