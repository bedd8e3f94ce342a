use anyhow::Result;

use crate::provision::Navigate;

/// Routing collaborator. Receives navigation instructions and interprets
/// them; this crate never looks inside the routing layer.
#[async_trait::async_trait]
pub trait RouterPort: Send + Sync {
    async fn navigate(&self, instruction: Navigate) -> Result<()>;
}
