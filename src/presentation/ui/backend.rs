use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Channel, ChannelId, Guild, LoadedImage, Member, MessageId, User, UserId};
use crate::domain::ports::{ChatClientPort, ClientEvent, FetchMessagesOptions, ImageLoaderPort};
use crate::presentation::widgets::{HistoryOutcome, INITIAL_HISTORY, ImageRequest, ImageTarget};

/// Page size of a backfill request.
const OLDER_PAGE: u8 = 30;

#[derive(Debug)]
pub enum Action {
    Connected {
        user: User,
        events: mpsc::UnboundedReceiver<ClientEvent>,
    },
    ConnectFailed(String),
    DataLoaded {
        guilds: Vec<(Guild, Vec<Channel>)>,
        dms: Vec<Channel>,
    },
    HistoryLoaded {
        channel_id: ChannelId,
        token: CancellationToken,
        outcome: HistoryOutcome,
    },
    OlderLoaded {
        channel_id: ChannelId,
        token: CancellationToken,
        outcome: HistoryOutcome,
    },
    MembersLoaded {
        channel_id: ChannelId,
        result: Result<Vec<Member>, String>,
    },
    ImageLoaded {
        target: ImageTarget,
        result: Result<LoadedImage, String>,
    },
    DmOpened(Result<Channel, String>),
}

#[derive(Debug)]
pub enum BackendCommand {
    Connect,
    LoadInitialData,
    LoadHistory {
        channel: Channel,
        token: CancellationToken,
    },
    LoadOlder {
        channel_id: ChannelId,
        before: MessageId,
        token: CancellationToken,
    },
    LoadMembers(Channel),
    LoadImages(Vec<ImageRequest>),
    OpenDm(UserId),
}

/// Runs network work off the UI task; every command is answered with an [`Action`].
pub struct Backend {
    worker: Worker,
    command_rx: mpsc::UnboundedReceiver<BackendCommand>,
}

#[derive(Clone)]
struct Worker {
    client: Arc<dyn ChatClientPort>,
    images: Arc<dyn ImageLoaderPort>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Backend {
    pub fn new(
        client: Arc<dyn ChatClientPort>,
        images: Arc<dyn ImageLoaderPort>,
        command_rx: mpsc::UnboundedReceiver<BackendCommand>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            worker: Worker {
                client,
                images,
                action_tx,
            },
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Backend worker started");
        while let Some(command) = self.command_rx.recv().await {
            let worker = self.worker.clone();
            tokio::spawn(async move { worker.handle_command(command).await });
        }
        info!("Backend worker stopped");
    }
}

impl Worker {
    fn send(&self, action: Action) {
        if self.action_tx.send(action).is_err() {
            debug!("UI gone, dropping backend action");
        }
    }

    async fn handle_command(&self, command: BackendCommand) {
        match command {
            BackendCommand::Connect => match self.client.connect().await {
                Ok((user, events)) => {
                    info!(user = %user.tag(), "Connected");
                    self.send(Action::Connected { user, events });
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect");
                    self.send(Action::ConnectFailed(e.to_string()));
                }
            },
            BackendCommand::LoadInitialData => self.load_initial_data().await,
            BackendCommand::LoadHistory { channel, token } => {
                let channel_id = channel.id();
                let outcome = load_history(self.client.as_ref(), channel_id, &token).await;
                self.send(Action::HistoryLoaded {
                    channel_id,
                    token,
                    outcome,
                });
            }
            BackendCommand::LoadOlder {
                channel_id,
                before,
                token,
            } => {
                let outcome = load_older(self.client.as_ref(), channel_id, before, &token).await;
                self.send(Action::OlderLoaded {
                    channel_id,
                    token,
                    outcome,
                });
            }
            BackendCommand::LoadMembers(channel) => {
                let result = self
                    .client
                    .channel_members(&channel)
                    .await
                    .map_err(|e| e.to_string());
                if let Ok(members) = &result {
                    debug!(channel_id = %channel.id(), count = members.len(), "Loaded members");
                }
                self.send(Action::MembersLoaded {
                    channel_id: channel.id(),
                    result,
                });
            }
            BackendCommand::LoadImages(requests) => {
                for request in requests {
                    let worker = self.clone();
                    tokio::spawn(async move { worker.load_image(request).await });
                }
            }
            BackendCommand::OpenDm(user_id) => {
                let result = self.client.open_dm(user_id).await.map_err(|e| {
                    warn!(user_id = %user_id, error = %e, "Failed to open DM");
                    e.to_string()
                });
                self.send(Action::DmOpened(result));
            }
        }
    }

    async fn load_initial_data(&self) {
        let guilds = match self.client.fetch_guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                warn!(error = %e, "Failed to load guilds");
                Vec::new()
            }
        };

        let mut listing = Vec::with_capacity(guilds.len());
        for guild in guilds {
            let channels = self.client.fetch_channels(guild.id()).await.unwrap_or_else(|e| {
                warn!(guild_id = %guild.id(), error = %e, "Failed to load channels for guild");
                Vec::new()
            });
            listing.push((guild, channels));
        }

        let dms = self.client.fetch_dm_channels().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load direct messages");
            Vec::new()
        });

        debug!(guilds = listing.len(), dms = dms.len(), "Initial data loaded");
        self.send(Action::DataLoaded {
            guilds: listing,
            dms,
        });
    }

    async fn load_image(&self, request: ImageRequest) {
        let result = self
            .images
            .load(&request.id, &request.url, request.cells)
            .await
            .map_err(|e| e.to_string());
        self.send(Action::ImageLoaded {
            target: request.target,
            result,
        });
    }
}

/// Latest page of a channel. The client cache answers alone only when live
/// updates keep it current and it holds a full page.
async fn load_history(
    client: &dyn ChatClientPort,
    channel_id: ChannelId,
    token: &CancellationToken,
) -> HistoryOutcome {
    let page = usize::from(INITIAL_HISTORY);
    if token.is_cancelled() {
        return HistoryOutcome::Cancelled;
    }

    let cached = client.cached_messages(channel_id, page).len();
    if !client.has_live_updates() || cached < page {
        let options = FetchMessagesOptions::default().with_limit(INITIAL_HISTORY);
        tokio::select! {
            biased;
            () = token.cancelled() => return HistoryOutcome::Cancelled,
            result = client.fetch_messages(channel_id, options) => {
                if let Err(e) = result {
                    warn!(channel_id = %channel_id, error = %e, "Failed to load messages for channel");
                    return HistoryOutcome::Failed(e.to_string());
                }
            }
        }
    }

    if token.is_cancelled() {
        return HistoryOutcome::Cancelled;
    }
    HistoryOutcome::Loaded(client.cached_messages(channel_id, page))
}

async fn load_older(
    client: &dyn ChatClientPort,
    channel_id: ChannelId,
    before: MessageId,
    token: &CancellationToken,
) -> HistoryOutcome {
    let options = FetchMessagesOptions::default()
        .with_limit(OLDER_PAGE)
        .before_message(before);
    tokio::select! {
        biased;
        () = token.cancelled() => HistoryOutcome::Cancelled,
        result = client.fetch_messages(channel_id, options) => match result {
            Ok(messages) => {
                debug!(channel_id = %channel_id, count = messages.len(), "Loaded older messages");
                HistoryOutcome::Loaded(messages)
            }
            Err(e) => HistoryOutcome::Failed(e.to_string()),
        },
    }
}
