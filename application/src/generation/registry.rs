use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::ports::outgoing::image_provider::DynImageProviderPort;
use domain::generation::ImageProvider;

/// Capability registry keyed by provider. Adding a backend means
/// registering one adapter; nothing downstream branches on the
/// concrete provider.
pub struct ProviderRegistry {
    providers: HashMap<ImageProvider, DynImageProviderPort>,
}

impl ProviderRegistry {
    pub fn new(adapters: Vec<DynImageProviderPort>) -> Self {
        let providers = adapters
            .into_iter()
            .map(|adapter| (adapter.provider(), adapter))
            .collect();
        Self { providers }
    }

    pub fn get(&self, provider: ImageProvider) -> AppResult<&DynImageProviderPort> {
        self.providers
            .get(&provider)
            .ok_or_else(|| AppError::ProviderUnavailable {
                message: format!("No adapter registered for provider {provider}"),
            })
    }

    #[must_use]
    pub fn registered(&self) -> Vec<ImageProvider> {
        self.providers.keys().copied().collect()
    }
}
