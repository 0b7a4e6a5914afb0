use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, DeserializeOwned, Error as _},
};
use serde_json::Value;
use std::fmt;

use crate::{
    game::{
        entities::{Action, PlayerId, TableSnapshot},
        states::Stage,
    },
    table::messages::TableEvent,
};

/// A message from a client to the table it's connected to.
///
/// On the wire every event is `{"event": "<name>", "payload": {...}}`.
/// Events that carry nothing may leave `payload` out or send `null`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Take a seat. Only possible before the first hand.
    JoinGame { name: String },
    /// Start the first hand, or propose dealing the next one.
    RequestStartGame {},
    /// Accept or reject an open restart proposal.
    RespondStartGame { accept: bool },
    /// One betting action from the player holding the turn.
    Bet(Action),
    DealFlop {},
    DealTurn {},
    DealRiver {},
    /// Resolve the hand once the river round has closed.
    Showdown {},
}

impl ClientEvent {
    /// Stage a deal event asks for.
    pub fn deal_stage(&self) -> Option<Stage> {
        match self {
            Self::DealFlop {} => Some(Stage::Flop),
            Self::DealTurn {} => Some(Stage::Turn),
            Self::DealRiver {} => Some(Stage::River),
            _ => None,
        }
    }
}

const CLIENT_EVENTS: &[&str] = &[
    "joinGame",
    "requestStartGame",
    "respondStartGame",
    "bet",
    "dealFlop",
    "dealTurn",
    "dealRiver",
    "showdown",
];

impl<'de> Deserialize<'de> for ClientEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Envelope {
            event: String,
            #[serde(default)]
            payload: Value,
        }

        #[derive(Deserialize)]
        struct Join {
            name: String,
        }

        #[derive(Deserialize)]
        struct Respond {
            accept: bool,
        }

        let Envelope { event, payload } = Envelope::deserialize(deserializer)?;
        match event.as_str() {
            "joinGame" => fields(payload).map(|Join { name }| Self::JoinGame { name }),
            "requestStartGame" => empty(&payload, Self::RequestStartGame {}),
            "respondStartGame" => {
                fields(payload).map(|Respond { accept }| Self::RespondStartGame { accept })
            }
            "bet" => fields(payload).map(Self::Bet),
            "dealFlop" => empty(&payload, Self::DealFlop {}),
            "dealTurn" => empty(&payload, Self::DealTurn {}),
            "dealRiver" => empty(&payload, Self::DealRiver {}),
            "showdown" => empty(&payload, Self::Showdown {}),
            other => Err(D::Error::unknown_variant(other, CLIENT_EVENTS)),
        }
    }
}

/// Payload of an event that carries fields.
fn fields<T: DeserializeOwned, E: de::Error>(payload: Value) -> Result<T, E> {
    serde_json::from_value(payload).map_err(E::custom)
}

/// Payload of an event that carries nothing: absent, `null` or any object.
fn empty<E: de::Error>(payload: &Value, event: ClientEvent) -> Result<ClientEvent, E> {
    match payload {
        Value::Null | Value::Object(_) => Ok(event),
        other => Err(E::custom(format!("expected an object payload, got {other}"))),
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr: &str = match self {
            Self::JoinGame { name } => &format!("joins as {name}"),
            Self::RequestStartGame {} => "requests a deal",
            Self::RespondStartGame { accept: true } => "accepts the restart",
            Self::RespondStartGame { accept: false } => "rejects the restart",
            Self::Bet(action) => &action.to_string(),
            Self::DealFlop {} => "deals the flop",
            Self::DealTurn {} => "deals the turn",
            Self::DealRiver {} => "deals the river",
            Self::Showdown {} => "calls the showdown",
        };
        write!(f, "{repr}")
    }
}

/// A message from the table to one client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Table state as the receiving client may see it.
    GameUpdate(Box<TableSnapshot>),
    StartGameRequest { requester: PlayerId },
    #[serde(rename_all = "camelCase")]
    RestartVoteRecorded { player_id: PlayerId, accept: bool },
    /// A rejected request. Only sent to whoever made it.
    Error { message: String },
}

impl ServerEvent {
    pub fn error(err: impl fmt::Display) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

impl From<TableEvent> for ServerEvent {
    fn from(event: TableEvent) -> Self {
        match event {
            TableEvent::GameUpdate(snapshot) => Self::GameUpdate(snapshot),
            TableEvent::StartGameRequest { requester } => Self::StartGameRequest { requester },
            TableEvent::RestartVoteRecorded { player_id, accept } => {
                Self::RestartVoteRecorded { player_id, accept }
            }
        }
    }
}
