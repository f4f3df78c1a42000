use async_trait::async_trait;
use paperchat_core::models::{PlanTier, SubscriptionPlan};
use paperchat_core::AppError;
use serde::Deserialize;

/// Resolves a user's subscription. Billing is an external collaborator;
/// this code consumes the answer, it never computes it.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn plan_for_user(&self, user_id: &str) -> Result<SubscriptionPlan, AppError>;
}

/// Billing-service client: `GET {endpoint}/subscriptions/{user_id}`.
#[derive(Clone)]
pub struct HttpSubscriptionService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubscriptionService {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SubscriptionResponse {
    is_subscribed: bool,
}

#[async_trait]
impl SubscriptionService for HttpSubscriptionService {
    #[tracing::instrument(skip(self))]
    async fn plan_for_user(&self, user_id: &str) -> Result<SubscriptionPlan, AppError> {
        let response = self
            .client
            .get(format!(
                "{}/subscriptions/{}",
                self.endpoint,
                urlencoding::encode(user_id)
            ))
            .send()
            .await
            .map_err(|e| AppError::Subscription(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Subscription(format!(
                "Billing endpoint returned {}",
                status
            )));
        }

        let parsed: SubscriptionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Subscription(format!("Invalid response body: {}", e)))?;

        Ok(SubscriptionPlan {
            tier: if parsed.is_subscribed {
                PlanTier::Pro
            } else {
                PlanTier::Free
            },
            is_subscribed: parsed.is_subscribed,
        })
    }
}

/// Fallback when no billing endpoint is configured: everyone is on the
/// free tier.
#[derive(Clone, Default)]
pub struct FreeTierSubscriptions;

#[async_trait]
impl SubscriptionService for FreeTierSubscriptions {
    async fn plan_for_user(&self, _user_id: &str) -> Result<SubscriptionPlan, AppError> {
        Ok(SubscriptionPlan::free())
    }
}
