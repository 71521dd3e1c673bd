//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: connection controller
//! - [`Driver`]: Platform-specific I/O

use crate::{App, AppAction, AppConfig, AppEvent, Driver};

/// Generic runtime that orchestrates App and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
pub struct Runtime<D>
where
    D: Driver,
{
    driver: D,
    app: App,
}

impl<D> Runtime<D>
where
    D: Driver,
{
    /// Create a new runtime with the given driver and controller config.
    pub fn new(driver: D, config: AppConfig) -> Self {
        Self { driver, app: App::new(config) }
    }

    /// Run the main event loop.
    ///
    /// This is the core orchestration loop that:
    /// 1. Polls for input and connection events from the driver
    /// 2. Feeds them to the App
    /// 3. Executes the resulting actions through the driver
    ///
    /// Ends on a quit action or when the driver runs out of events.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let Some(event) = self.driver.poll_event().await? else {
            tracing::debug!("event source exhausted, quitting");
            let actions = self.app.quit();
            self.process_actions(actions).await?;
            return Ok(true);
        };

        self.dispatch(event).await
    }

    /// Feed one event to the App and execute the resulting actions.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn dispatch(&mut self, event: AppEvent) -> Result<bool, D::Error> {
        // The transport can go away before its close event is processed.
        if self.app.would_send(&event)
            && let Some(handle) = self.app.current_handle()
            && !self.driver.is_open(handle)
        {
            tracing::warn!(%handle, "connection no longer open, dropping chat line");
            return Ok(false);
        }

        let actions = self.app.handle(event);
        self.process_actions(actions).await
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::Open { handle, endpoint } => {
                        if let Err(e) = self.driver.open(handle, &endpoint) {
                            tracing::warn!(%handle, "failed to open connection: {e}");
                            let event = AppEvent::SetupFailed { handle, reason: e.to_string() };
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                    AppAction::Send { handle, text } => {
                        if let Err(e) = self.driver.send(handle, text).await {
                            tracing::warn!(%handle, "failed to send: {e}");
                        }
                    },
                    AppAction::Close { handle } => self.driver.close(handle),
                }
            }
        }
        Ok(false)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
