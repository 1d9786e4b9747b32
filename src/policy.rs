use crate::profiles::ProfileStore;
use crate::registry::SearchRegistry;
use crate::types::{Error, Result, SearchAllowance, User, UserProfile};
use tracing::warn;

/// Gate in front of every new keyword search: privilege bypass, block
/// flag, and the per-user quota on distinct tracked keywords.
pub struct AccessPolicy {
    profiles: ProfileStore,
    registry: SearchRegistry,
}

impl AccessPolicy {
    pub fn new(profiles: ProfileStore, registry: SearchRegistry) -> Self {
        Self { profiles, registry }
    }

    pub async fn can_search(&self, user: &User) -> Result<SearchAllowance> {
        if user.is_privileged() {
            return Ok(SearchAllowance {
                remaining_quota: None,
            });
        }

        let profile = self.profiles.get(user.id).await?;
        let tracked = self.registry.count_for_user(user.id).await?;

        evaluate(user, profile.as_ref(), tracked).map_err(|e| {
            warn!("search denied for {}: {}", user.username, e);
            e
        })
    }
}

/// The policy decision itself, separated from storage. A missing profile
/// is its own failure, never treated as unlimited or as blocked.
pub fn evaluate(
    user: &User,
    profile: Option<&UserProfile>,
    tracked: i64,
) -> Result<SearchAllowance> {
    if user.is_privileged() {
        return Ok(SearchAllowance {
            remaining_quota: None,
        });
    }

    let profile = profile.ok_or(Error::ProfileNotFound { user_id: user.id })?;

    if profile.is_blocked {
        return Err(Error::Blocked);
    }

    let quota = i64::from(profile.keyword_quota);
    if tracked >= quota {
        return Err(Error::QuotaExceeded {
            quota: profile.keyword_quota,
        });
    }

    Ok(SearchAllowance {
        remaining_quota: Some(quota - tracked),
    })
}
