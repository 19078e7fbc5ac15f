//! Main application orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use futures_util::future::Either;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval};
use tracing::{debug, error, info, warn};

use crate::application::{AppEvent, EventBus};
use crate::domain::ports::{ChatClientPort, ClientEvent, ImageLoaderPort};
use crate::infrastructure::config::{AppConfig, StorageManager};
use crate::presentation::commands::{KeyAction, UiCommand};
use crate::presentation::events::{EventResult, key_press};
use crate::presentation::ui::backend::{Action, Backend, BackendCommand};
use crate::presentation::ui::main_screen::MainScreen;

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const TICK_RATE: Duration = Duration::from_millis(100);

pub struct App {
    screen: MainScreen,
    config: AppConfig,
    storage: StorageManager,
    bus: EventBus,
    app_rx: mpsc::UnboundedReceiver<AppEvent>,
    command_tx: mpsc::UnboundedSender<BackendCommand>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    client_rx: Option<mpsc::UnboundedReceiver<ClientEvent>>,
    status: Option<String>,
    running: bool,
}

impl App {
    /// Builds the application and spawns its backend worker.
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatClientPort>,
        images: Arc<dyn ImageLoaderPort>,
        config: AppConfig,
        storage: StorageManager,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        tokio::spawn(Backend::new(client, images, command_rx, action_tx).run());

        let (bus, app_rx) = EventBus::new();
        Self {
            screen: MainScreen::new(&config.ui),
            config,
            storage,
            bus,
            app_rx,
            command_tx,
            action_rx,
            client_rx: None,
            status: None,
            running: true,
        }
    }

    #[must_use]
    pub const fn screen(&self) -> &MainScreen {
        &self.screen
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Last connection or load failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        self.send(BackendCommand::Connect);
        self.send(BackendCommand::LoadInitialData);

        self.run_event_loop(terminal).await?;

        info!("Application exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();
        let mut sweep_interval = interval(SWEEP_INTERVAL);
        let mut tick_interval = interval(TICK_RATE);

        self.draw(terminal)?;

        while self.running {
            let client_event = match &mut self.client_rx {
                Some(rx) => Either::Left(rx.recv()),
                None => Either::Right(std::future::pending()),
            };

            let redraw = tokio::select! {
                biased;

                Some(Ok(event)) = terminal_events.next() => {
                    self.handle_terminal_event(&event) != EventResult::Continue
                        || matches!(event, Event::Resize(..))
                }

                Some(event) = self.app_rx.recv() => {
                    self.dispatch_app_event(&event);
                    true
                }

                Some(action) = self.action_rx.recv() => {
                    self.handle_backend_action(action);
                    true
                }

                event = client_event => match event {
                    Some(event) => self.screen.handle_client_event(event),
                    None => {
                        warn!("Client event stream closed");
                        self.client_rx = None;
                        false
                    }
                },

                _ = sweep_interval.tick() => {
                    let removed = self.screen.sweep();
                    if removed > 0 {
                        debug!(removed, "Swept dead user buttons");
                    }
                    false
                }

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    if let Some(command) = self.screen.on_tick(now) {
                        self.run_command(command);
                        true
                    } else {
                        self.screen.has_deferred_pass(now)
                    }
                }
            };

            if redraw && self.running {
                self.draw(terminal)?;
            }
        }
        Ok(())
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            self.screen.render(area, frame.buffer_mut());
        })?;
        for command in self.screen.after_draw(Instant::now()) {
            self.run_command(command);
        }
        Ok(())
    }

    fn handle_terminal_event(&mut self, event: &Event) -> EventResult {
        let Some(key) = key_press(event) else {
            return EventResult::Continue;
        };
        let Some(action) = self.screen.commands().find_action(key) else {
            return EventResult::Continue;
        };
        let result = self.handle_key_action(action);
        if result == EventResult::Exit {
            self.running = false;
        }
        result
    }

    /// Global keys first, then whatever pane or popup has focus.
    pub fn handle_key_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Quit => return EventResult::Exit,
            KeyAction::ToggleMembersList => {
                self.config.ui.hide_members_list = !self.config.ui.hide_members_list;
                self.config_changed();
            }
            KeyAction::ToggleAvatars => {
                self.config.ui.enable_avatars = !self.config.ui.enable_avatars;
                self.config_changed();
            }
            _ => {
                for command in self.screen.handle_action(action) {
                    self.run_command(command);
                }
            }
        }
        EventResult::Consumed
    }

    fn config_changed(&mut self) {
        if let Err(e) = self.storage.save_config(&self.config) {
            warn!(error = %e, "Failed to save configuration");
        }
        self.bus.emit(AppEvent::ConfigUpdate(self.config.ui.clone()));
    }

    fn dispatch_app_event(&mut self, event: &AppEvent) {
        for command in self.screen.handle_app_event(event, Instant::now()) {
            self.run_command(command);
        }
    }

    fn handle_backend_action(&mut self, action: Action) {
        match action {
            Action::Connected { user, events } => {
                self.client_rx = Some(events);
                self.status = None;
                self.bus.emit(AppEvent::NewClient { user });
            }
            Action::ConnectFailed(message) => {
                error!(error = %message, "Connection failed");
                self.status = Some(message);
            }
            Action::DataLoaded { guilds, dms } => self.screen.on_data_loaded(guilds, dms),
            Action::HistoryLoaded {
                channel_id,
                token,
                outcome,
            } => {
                debug!(channel_id = %channel_id, "History result");
                self.screen.on_history_loaded(&token, outcome);
            }
            Action::OlderLoaded {
                channel_id,
                token,
                outcome,
            } => self.screen.on_older_loaded(channel_id, &token, outcome),
            Action::MembersLoaded { channel_id, result } => {
                self.screen.on_members_loaded(channel_id, result);
            }
            Action::ImageLoaded { target, result } => self.screen.on_image_loaded(&target, result),
            Action::DmOpened(Ok(channel)) => {
                let event = self.screen.on_dm_opened(channel);
                self.bus.emit(event);
            }
            Action::DmOpened(Err(message)) => self.status = Some(message),
        }
    }

    fn run_command(&self, command: UiCommand) {
        let command = match command {
            UiCommand::Emit(event) => {
                self.bus.emit(event);
                return;
            }
            UiCommand::OpenDm(user_id) => BackendCommand::OpenDm(user_id),
            UiCommand::LoadMembers(channel) => BackendCommand::LoadMembers(channel),
            UiCommand::LoadHistory { channel, token } => BackendCommand::LoadHistory { channel, token },
            UiCommand::LoadOlder {
                channel_id,
                before,
                token,
            } => BackendCommand::LoadOlder {
                channel_id,
                before,
                token,
            },
            UiCommand::LoadImages(requests) => BackendCommand::LoadImages(requests),
        };
        self.send(command);
    }

    fn send(&self, command: BackendCommand) {
        if self.command_tx.send(command).is_err() {
            error!("Backend worker is gone");
        }
    }

    /// Drains queued application events and backend actions; used in tests
    /// in place of the terminal loop.
    #[cfg(test)]
    async fn settle(&mut self) {
        loop {
            tokio::task::yield_now().await;
            if let Ok(event) = self.app_rx.try_recv() {
                self.dispatch_app_event(&event);
            } else if let Ok(action) = self.action_rx.try_recv() {
                self.handle_backend_action(action);
            } else {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if self.app_rx.is_empty() && self.action_rx.is_empty() {
                    break;
                }
            }
        }
    }
}
