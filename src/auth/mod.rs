use tracing::{debug, info};

use crate::db::{Chatter, Store, StoreError, StoreResult};

/// Returns the chatter owning `token`, creating "User No. N" on first contact.
///
/// Two first contacts racing on the same token both try to insert; the loser
/// hits the unique username and reads the winner's row back.
pub async fn resolve_chatter(store: &Store, token: &str) -> StoreResult<Chatter> {
    if token.is_empty() {
        return Err(StoreError::Validation("session token cannot be empty"));
    }

    match store.get_chatter_by_username(token).await {
        Err(StoreError::NotFound(_)) => {}
        found => return found,
    }

    let total = store.count_chatters().await?;
    let display_name = format!("User No. {}", total + 1);
    insert_or_reread(store, token, &display_name).await
}

/// Get-or-create for chatters with a fixed display name, such as bots.
pub async fn ensure_chatter(store: &Store, username: &str, display_name: &str) -> StoreResult<Chatter> {
    match store.get_chatter_by_username(username).await {
        Err(StoreError::NotFound(_)) => insert_or_reread(store, username, display_name).await,
        found => found,
    }
}

async fn insert_or_reread(store: &Store, username: &str, display_name: &str) -> StoreResult<Chatter> {
    match store.insert_chatter(username, display_name).await {
        Ok(chatter) => {
            info!(chatter_id = chatter.id, "welcome {}", chatter.display_name);
            Ok(chatter)
        }
        Err(StoreError::Conflict(_)) => {
            debug!("chatter created concurrently, reading it back");
            store.get_chatter_by_username(username).await
        }
        Err(err) => Err(err),
    }
}
