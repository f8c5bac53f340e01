//! Moderation backend that only logs.

use async_trait::async_trait;
use tracing::info;

use super::api::{BanRequest, HelixError, MAX_LOGINS_PER_LOOKUP, ModerationApi, PlatformUser};

/// Resolves every login to itself and logs timeouts instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunModeration;

#[async_trait]
impl ModerationApi for DryRunModeration {
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<PlatformUser>, HelixError> {
        if logins.len() > MAX_LOGINS_PER_LOOKUP {
            return Err(HelixError::TooManyLogins {
                count: logins.len(),
                max: MAX_LOGINS_PER_LOOKUP,
            });
        }

        Ok(logins
            .iter()
            .map(|login| PlatformUser {
                login: login.clone(),
                id: login.clone(),
            })
            .collect())
    }

    async fn ban_user(&self, request: &BanRequest) -> Result<(), HelixError> {
        info!(
            user_id = %request.user_id,
            duration = request.duration_seconds,
            "[dry run] would time out user: {}",
            request.reason
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_logins_to_themselves() {
        let users = DryRunModeration
            .lookup_users(&["bob".to_owned()])
            .await
            .unwrap();
        assert_eq!(
            users,
            vec![PlatformUser {
                login: "bob".to_owned(),
                id: "bob".to_owned(),
            }]
        );
    }
}
