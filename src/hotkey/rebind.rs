//! Active hotkey ownership and the rebind transaction
//!
//! `HotkeyService` is the only writer of the active binding. A rebind
//! unregisters the current binding, registers the candidate, and on failure
//! re-registers the previous one. The OS never holds two of our bindings at
//! once; between unregister and register it briefly holds none.

use super::store::BindingStore;
use super::{HotkeyBinding, HotkeyRegistrar};
use crate::error::HotkeyError;

pub struct HotkeyService<R> {
    registrar: R,
    store: BindingStore,
    /// Binding currently registered with the OS, None when registration
    /// failed or was lost
    active: Option<HotkeyBinding>,
    /// Binding the user chose last, shown even when it is not registered
    preferred: HotkeyBinding,
}

impl<R: HotkeyRegistrar> HotkeyService<R> {
    /// Create the service with the binding persisted in `store`.
    /// Nothing is registered until [`Self::activate`].
    pub fn new(registrar: R, store: BindingStore) -> Self {
        let preferred = store.load();
        Self {
            registrar,
            store,
            active: None,
            preferred,
        }
    }

    pub fn active(&self) -> Option<HotkeyBinding> {
        self.active
    }

    /// The binding to display: the active one, or the persisted choice
    pub fn binding(&self) -> HotkeyBinding {
        self.active.unwrap_or(self.preferred)
    }

    /// Register the persisted binding at startup
    pub fn activate(&mut self) -> Result<HotkeyBinding, HotkeyError> {
        let binding = self.preferred;
        self.registrar.register(&binding)?;
        self.active = Some(binding);
        tracing::info!("Registered global hotkey {}", binding);
        Ok(binding)
    }

    pub fn owns_event(&self, id: u32) -> bool {
        self.active.is_some() && self.registrar.owns_event(id)
    }

    /// Swap the active binding for `candidate`.
    ///
    /// On success the candidate is active and persisted. On failure the
    /// previous binding is re-registered and `RegistrationConflict` returned;
    /// if that also fails, no binding is active and `RegistrationLost` is
    /// returned.
    pub fn rebind(&mut self, candidate: HotkeyBinding) -> Result<HotkeyBinding, HotkeyError> {
        if self.active == Some(candidate) {
            tracing::debug!("Hotkey {} is already active", candidate);
            return Ok(candidate);
        }

        let previous = self.active.take();
        if let Err(e) = self.registrar.unregister() {
            tracing::warn!("Failed to unregister hotkey: {}", e);
        }

        match self.registrar.register(&candidate) {
            Ok(()) => {
                self.active = Some(candidate);
                self.preferred = candidate;
                if let Err(e) = self.store.save(&candidate) {
                    tracing::warn!("Failed to persist hotkey {}: {}", candidate, e);
                }
                tracing::info!("Hotkey changed to {}", candidate);
                Ok(candidate)
            }
            Err(e) => {
                tracing::warn!("Cannot register {}: {}", candidate, e);
                let Some(previous) = previous else {
                    return Err(HotkeyError::RegistrationConflict(candidate.to_string()));
                };

                match self.registrar.register(&previous) {
                    Ok(()) => {
                        self.active = Some(previous);
                        Err(HotkeyError::RegistrationConflict(candidate.to_string()))
                    }
                    Err(e) => {
                        tracing::error!("Failed to restore hotkey {}: {}", previous, e);
                        Err(HotkeyError::RegistrationLost(previous.to_string()))
                    }
                }
            }
        }
    }

    /// Whether an OS registration service exists
    pub fn is_available(&self) -> bool {
        self.registrar.is_available()
    }

    /// Unregister the active binding
    pub fn shutdown(&mut self) {
        if self.active.take().is_some() {
            if let Err(e) = self.registrar.unregister() {
                tracing::warn!("Failed to unregister hotkey on shutdown: {}", e);
            }
        }
    }
}
