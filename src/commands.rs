//! Async side effects.
//!
//! Services return commands from `update()`; the App spawns each one on tokio
//! and tracks it until it finishes. Results travel back through the owning
//! service's message channel.

use async_trait::async_trait;
use color_eyre::Result;

#[async_trait]
pub trait Command: Send + 'static {
    /// Shown in the status bar while the command runs.
    fn name(&self) -> String;

    async fn execute(self: Box<Self>) -> Result<()>;
}
