use async_trait::async_trait;
use todo_core::Identity;

use crate::error::ChannelError;

/// The host's outgoing response for the current exchange. Once it has started
/// transmitting, sign-in and sign-out must wait for the next safe point.
#[async_trait]
pub trait ResponseChannel: Send + Sync {
    fn has_started(&self) -> bool;
    async fn sign_in(&self, identity: &Identity) -> Result<(), ChannelError>;
    async fn sign_out(&self) -> Result<(), ChannelError>;
}

/// For hosts without a response stream: never started, nothing to sign.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedChannel;

#[async_trait]
impl ResponseChannel for DetachedChannel {
    fn has_started(&self) -> bool {
        false
    }

    async fn sign_in(&self, _identity: &Identity) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
