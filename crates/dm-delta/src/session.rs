//! Scoped provider connection

use crate::error::ProviderResult;
use crate::provider::DeltaProvider;

/// Connected provider that is disconnected when the session is dropped.
pub struct ProviderSession<'a> {
    provider: &'a mut dyn DeltaProvider,
}

impl<'a> ProviderSession<'a> {
    /// Connect `provider` to `uri` for the lifetime of the session
    pub fn open(provider: &'a mut dyn DeltaProvider, uri: &str) -> ProviderResult<Self> {
        if let Err(e) = provider.connect(uri) {
            provider.disconnect();
            return Err(e);
        }
        Ok(Self { provider })
    }

    pub fn provider(&self) -> &dyn DeltaProvider {
        &*self.provider
    }

    pub fn provider_mut(&mut self) -> &mut dyn DeltaProvider {
        &mut *self.provider
    }
}

impl Drop for ProviderSession<'_> {
    fn drop(&mut self) {
        self.provider.disconnect();
        log::debug!("Delta provider disconnected");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
