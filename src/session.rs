use tower_sessions::Session;
use uuid::Uuid;

use crate::AppResult;

pub const CHATTER_TOKEN: &str = "chatter_token";

/// The browser's anonymous token, minted on first contact.
pub async fn token(session: &Session) -> AppResult<String> {
    if let Some(token) = session.get::<String>(CHATTER_TOKEN).await? {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let token = Uuid::now_v7().to_string();
    session.insert(CHATTER_TOKEN, &token).await?;
    Ok(token)
}
