use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use builder_api::containers::ValidatorRegistrationV1;
use parking_lot::RwLock;
use types::phase0::primitives::ValidatorIndex;

use crate::error::RegistrationError;

/// Storage of builder registrations submitted by validator clients.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn registration(
        &self,
        validator_index: ValidatorIndex,
    ) -> Result<Option<ValidatorRegistrationV1>>;
}

#[derive(Default)]
pub struct InMemoryRegistrationStore {
    registrations: RwLock<HashMap<ValidatorIndex, ValidatorRegistrationV1>>,
}

impl InMemoryRegistrationStore {
    /// Newer registrations replace older ones for the same validator.
    pub fn save_registrations(
        &self,
        registrations: impl IntoIterator<Item = (ValidatorIndex, ValidatorRegistrationV1)>,
    ) {
        self.registrations.write().extend(registrations);
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn registration(
        &self,
        validator_index: ValidatorIndex,
    ) -> Result<Option<ValidatorRegistrationV1>> {
        Ok(self.registrations.read().get(&validator_index).copied())
    }
}

/// Read-only view used to decide whether a proposer may use the builder.
pub struct ValidatorRegistrationStore {
    store: Option<Arc<dyn RegistrationStore>>,
}

impl ValidatorRegistrationStore {
    #[must_use]
    pub fn new(store: Option<Arc<dyn RegistrationStore>>) -> Self {
        Self { store }
    }

    pub async fn is_registered(
        &self,
        validator_index: ValidatorIndex,
    ) -> Result<bool, RegistrationError> {
        let store = self
            .store
            .as_ref()
            .ok_or(RegistrationError::StoreUnavailable)?;

        let registration = store
            .registration(validator_index)
            .await
            .map_err(|error| RegistrationError::Lookup {
                validator_index,
                error,
            })?;

        Ok(registration.is_some())
    }
}
