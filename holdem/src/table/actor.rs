//! Table actor implementation with async message handling.
//!
//! The actor is the only writer of its [`TableSession`]. Messages are handled
//! one at a time in arrival order, and every accepted mutation is followed by
//! a per-viewer `GameUpdate` to each subscriber.

use std::collections::HashMap;

use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

use super::{
    TableId,
    config::TableConfig,
    messages::{TableError, TableEvent, TableMessage, TableSummary},
};
use crate::{
    game::{
        GameError, StartOutcome, TableSession,
        betting::RoundStatus,
        entities::{Action, PlayerId, SeatIndex, TableSnapshot},
        restart::VoteProgress,
        states::Stage,
    },
    net::messages::ClientEvent,
};

/// Inbox capacity per table.
const INBOX_CAPACITY: usize = 100;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed(self.table_id))
    }

    /// Send a message built around a response channel and wait for the reply.
    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(message(tx)).await?;
        rx.await.map_err(|_| TableError::Closed(self.table_id))
    }

    pub async fn join(&self, player_id: PlayerId, name: String) -> Result<SeatIndex, TableError> {
        Ok(self
            .request(|response| TableMessage::Join {
                player_id,
                name,
                response,
            })
            .await??)
    }

    pub async fn request_start(&self, player_id: PlayerId) -> Result<StartOutcome, TableError> {
        Ok(self
            .request(|response| TableMessage::RequestStart {
                player_id,
                response,
            })
            .await??)
    }

    pub async fn respond_start(
        &self,
        player_id: PlayerId,
        accept: bool,
    ) -> Result<VoteProgress, TableError> {
        Ok(self
            .request(|response| TableMessage::RespondStart {
                player_id,
                accept,
                response,
            })
            .await??)
    }

    pub async fn take_action(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<RoundStatus, TableError> {
        Ok(self
            .request(|response| TableMessage::TakeAction {
                player_id,
                action,
                response,
            })
            .await??)
    }

    pub async fn deal(&self, stage: Stage) -> Result<Stage, TableError> {
        Ok(self
            .request(|response| TableMessage::Deal { stage, response })
            .await??)
    }

    pub async fn showdown(&self) -> Result<(), TableError> {
        Ok(self
            .request(|response| TableMessage::Showdown { response })
            .await??)
    }

    pub async fn snapshot(&self, viewer: Option<PlayerId>) -> Result<TableSnapshot, TableError> {
        self.request(|response| TableMessage::GetSnapshot { viewer, response })
            .await
    }

    pub async fn summary(&self) -> Result<TableSummary, TableError> {
        self.request(|response| TableMessage::GetSummary { response })
            .await
    }

    pub async fn subscribe(
        &self,
        subscriber: PlayerId,
        sender: mpsc::Sender<TableEvent>,
    ) -> Result<(), TableError> {
        self.send(TableMessage::Subscribe { subscriber, sender })
            .await
    }

    pub async fn unsubscribe(&self, subscriber: PlayerId) -> Result<(), TableError> {
        self.send(TableMessage::Unsubscribe { subscriber }).await
    }

    pub async fn close(&self) -> Result<(), TableError> {
        self.request(|response| TableMessage::Close { response })
            .await
    }

    /// Route one client event to the matching table operation.
    pub async fn dispatch(&self, player_id: &PlayerId, event: ClientEvent) -> Result<(), TableError> {
        if let Some(stage) = event.deal_stage() {
            return self.deal(stage).await.map(drop);
        }
        let player_id = player_id.clone();
        match event {
            ClientEvent::JoinGame { name } => self.join(player_id, name).await.map(drop),
            ClientEvent::RequestStartGame {} => self.request_start(player_id).await.map(drop),
            ClientEvent::RespondStartGame { accept } => {
                self.respond_start(player_id, accept).await.map(drop)
            }
            ClientEvent::Bet(action) => self.take_action(player_id, action).await.map(drop),
            ClientEvent::Showdown {} => self.showdown().await,
            // Handled above.
            ClientEvent::DealFlop {} | ClientEvent::DealTurn {} | ClientEvent::DealRiver {} => {
                Ok(())
            }
        }
    }
}

/// Who the armed turn timer is waiting on.
#[derive(Debug)]
struct TurnTimer {
    deadline: Instant,
    player_id: PlayerId,
    /// Session version when the timer was armed.
    version: u64,
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Game state, owned exclusively by this actor
    session: TableSession,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Subscribers for table events, keyed by connection
    subscribers: HashMap<PlayerId, mpsc::Sender<TableEvent>>,

    /// Pending auto-fold for the player holding the turn
    turn_timer: Option<TurnTimer>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor and the handle used to reach it.
    pub fn new(id: TableId, config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let session = TableSession::from(config.game_settings());

        let actor = Self {
            id,
            config,
            session,
            inbox,
            subscribers: HashMap::new(),
            turn_timer: None,
            is_closed: false,
        };

        (actor, TableHandle::new(sender, id))
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        loop {
            let deadline = self.turn_timer.as_ref().map(|timer| timer.deadline);

            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        // Every handle is gone.
                        break;
                    };
                    self.handle_message(message);
                    if self.is_closed {
                        break;
                    }
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_turn_timeout();
                }
            }
        }

        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join {
                player_id,
                name,
                response,
            } => {
                let result = self.session.join(player_id, &name);
                if result.is_ok() {
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            TableMessage::RequestStart {
                player_id,
                response,
            } => {
                let result = self.session.request_start(&player_id);
                match &result {
                    Ok(outcome) => {
                        if *outcome == StartOutcome::VoteOpened {
                            self.broadcast(TableEvent::StartGameRequest {
                                requester: player_id.clone(),
                            });
                        }
                        self.after_mutation();
                    }
                    Err(e) if hand_aborted(e) => self.after_mutation(),
                    Err(_) => {}
                }
                let _ = response.send(result);
            }

            TableMessage::RespondStart {
                player_id,
                accept,
                response,
            } => {
                let result = self.session.respond_start(&player_id, accept);
                match &result {
                    Ok(_) => {
                        self.broadcast(TableEvent::RestartVoteRecorded {
                            player_id: player_id.clone(),
                            accept,
                        });
                        self.after_mutation();
                    }
                    // The ballot completed the vote but the deal failed.
                    Err(e) if hand_aborted(e) => self.after_mutation(),
                    Err(_) => {}
                }
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                player_id,
                action,
                response,
            } => {
                let result = self.session.apply_action(&player_id, action);
                if result.is_ok() {
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            TableMessage::Deal { stage, response } => {
                let result = self.session.deal(stage);
                if result.is_ok() || result.as_ref().is_err_and(hand_aborted) {
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            TableMessage::Showdown { response } => {
                let result = self.session.resolve_showdown();
                if result.is_ok() {
                    self.after_mutation();
                }
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { viewer, response } => {
                let snapshot = match &viewer {
                    Some(viewer) => self.session.snapshot_for(viewer),
                    None => self.session.snapshot(),
                };
                let _ = response.send(snapshot);
            }

            TableMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            TableMessage::Subscribe { subscriber, sender } => {
                let update = TableEvent::GameUpdate(Box::new(self.session.snapshot_for(&subscriber)));
                if sender.try_send(update).is_ok() {
                    log::debug!("{subscriber} subscribed to table {}", self.id);
                    self.subscribers.insert(subscriber, sender);
                }
            }

            TableMessage::Unsubscribe { subscriber } => {
                self.subscribers.remove(&subscriber);
                log::debug!("{subscriber} unsubscribed from table {}", self.id);
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn summary(&self) -> TableSummary {
        TableSummary {
            id: self.id,
            name: self.config.name.clone(),
            player_count: self.session.players().len(),
            max_players: self.config.max_players,
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            stage: self.session.stage(),
            hand_number: self.session.hand_number(),
        }
    }

    /// Push fresh views and re-arm the turn timer.
    fn after_mutation(&mut self) {
        let session = &self.session;
        notify(&mut self.subscribers, |viewer| {
            TableEvent::GameUpdate(Box::new(session.snapshot_for(viewer)))
        });
        self.arm_turn_timer();
    }

    fn broadcast(&mut self, event: TableEvent) {
        notify(&mut self.subscribers, |_| event.clone());
    }

    fn arm_turn_timer(&mut self) {
        self.turn_timer = match (self.config.action_timeout(), self.session.current_turn()) {
            (Some(timeout), Some(player_id)) => Some(TurnTimer {
                deadline: Instant::now() + timeout,
                player_id: player_id.clone(),
                version: self.session.version(),
            }),
            _ => None,
        };
    }

    /// Fold the idle player, unless the turn moved on since the timer was armed.
    fn handle_turn_timeout(&mut self) {
        let Some(timer) = self.turn_timer.take() else {
            return;
        };
        let still_waiting = self.session.version() == timer.version
            && self.session.current_turn() == Some(&timer.player_id);
        if !still_waiting {
            return;
        }

        log::info!(
            "Table {}: {} timed out, folding",
            self.id,
            timer.player_id
        );
        match self.session.apply_action(&timer.player_id, Action::Fold) {
            Ok(_) => self.after_mutation(),
            Err(e) => log::warn!("Table {}: auto-fold rejected: {e}", self.id),
        }
    }
}

/// A deck failure aborts the hand and sends the table back to the lobby,
/// which everyone needs to see.
fn hand_aborted(error: &GameError) -> bool {
    matches!(error, GameError::DeckExhausted { .. })
}

/// Send an event built per subscriber, dropping subscribers whose
/// receivers are gone.
fn notify(
    subscribers: &mut HashMap<PlayerId, mpsc::Sender<TableEvent>>,
    event_for: impl Fn(&PlayerId) -> TableEvent,
) {
    subscribers.retain(|id, sender| match sender.try_send(event_for(id)) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("Subscriber {id} channel full, dropping event");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("Subscriber {id} disconnected, removing");
            false
        }
    });
}
