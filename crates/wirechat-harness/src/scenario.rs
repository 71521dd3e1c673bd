//! Scenario helpers.
//!
//! [`SimClient`] bundles a [`Runtime`] over a [`SimDriver`] and drives it
//! until the simulated world is quiet, so tests read as operator steps.

use wirechat_app::{App, AppConfig, Runtime};

use crate::{InvariantRegistry, SimDriver, SimDriverError, SimNetwork};

/// One simulated operator with their client.
pub struct SimClient {
    runtime: Runtime<SimDriver>,
}

impl SimClient {
    /// Wrap an already configured driver.
    pub fn new(driver: SimDriver, config: AppConfig) -> Self {
        Self { runtime: Runtime::new(driver, config) }
    }

    /// Client on `network`, checking the standard invariants on every render.
    pub fn on(network: &SimNetwork, config: AppConfig) -> Self {
        let driver = SimDriver::connected_to(network).with_invariants(InvariantRegistry::standard());
        Self::new(driver, config)
    }

    /// Client without a network; link notifications are injected by hand.
    pub fn standalone(config: AppConfig) -> Self {
        let driver = SimDriver::new().with_invariants(InvariantRegistry::standard());
        Self::new(driver, config)
    }

    /// Process events until none are pending.
    ///
    /// Returns `true` if the App asked to quit.
    pub async fn settle(&mut self) -> Result<bool, SimDriverError> {
        while self.runtime.driver().has_pending() {
            if self.runtime.process_cycle().await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Submit a line and settle.
    pub async fn submit(&mut self, line: &str) -> Result<bool, SimDriverError> {
        self.runtime.driver().inject_line(line);
        self.settle().await
    }

    /// Type a line key by key, press Enter, and settle.
    pub async fn type_line(&mut self, text: &str) -> Result<bool, SimDriverError> {
        self.runtime.driver().inject_typed(text);
        self.settle().await
    }

    /// Controller state.
    pub fn app(&self) -> &App {
        self.runtime.app()
    }

    /// Simulation driver.
    pub fn driver(&self) -> &SimDriver {
        self.runtime.driver()
    }

    /// Underlying runtime.
    pub fn runtime_mut(&mut self) -> &mut Runtime<SimDriver> {
        &mut self.runtime
    }
}
