//! Wire record definitions
//!
//! JSON-based protocol records exchanged after framing: the one-time
//! `Handshake` and the routed `Envelope`. Field names are camelCase on
//! the wire; control codes travel as bare integers.

use serde::{Deserialize, Serialize};

use crate::types::{timestamp_now, SessionId};

/// Sender name used for all server-originated envelopes.
pub const SERVER_NAME: &str = "SERVER";

/// Welcome text embedded in the greeting handshake.
pub const WELCOME_TEXT: &str = "Hi. You are connected!";

/// Control code attached to server-originated envelopes
///
/// Absent (`null`) means plain chat. Travels as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Action {
    /// A session completed its handshake
    Joined = 1,
    /// A session disconnected
    Left = 2,
    /// A session was removed by the operator
    Kicked = 3,
    /// Handshake rejected: display name already taken
    NameError = 4,
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action as u8
    }
}

impl TryFrom<u8> for Action {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Action::Joined),
            2 => Ok(Action::Left),
            3 => Ok(Action::Kicked),
            4 => Ok(Action::NameError),
            other => Err(format!("unknown action code: {other}")),
        }
    }
}

/// Presentation hint for the receiving client
///
/// Carries no protocol meaning; `null` decodes as `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DisplayHint {
    Default = 0,
    Joined = 1,
    Whisper = 2,
}

impl From<DisplayHint> for u8 {
    fn from(hint: DisplayHint) -> u8 {
        hint as u8
    }
}

impl TryFrom<u8> for DisplayHint {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DisplayHint::Default),
            1 => Ok(DisplayHint::Joined),
            2 => Ok(DisplayHint::Whisper),
            other => Err(format!("unknown display hint: {other}")),
        }
    }
}

/// One-time record exchanged before any envelope
///
/// The server sends it populated with the assigned id, online count,
/// welcome text, and banner; the client returns the same record with
/// `name` filled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub id: SessionId,
    pub name: String,
    pub text: String,
    pub users_online: usize,
    pub header: String,
    pub timestamp: String,
}

impl Handshake {
    /// Build the server → client greeting leg.
    pub fn greeting(id: SessionId, users_online: usize, header: &str) -> Self {
        Self {
            id,
            name: String::new(),
            text: WELCOME_TEXT.to_string(),
            users_online,
            header: header.to_string(),
            timestamp: timestamp_now(),
        }
    }

    /// Fill in the display name for the client → server return leg.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// The routed chat/control message exchanged after handshake
///
/// `sender_id == None` marks server origin. `to_name == None` means
/// broadcast; a present `to_name` is a whisper target display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub sender_id: Option<SessionId>,
    pub sender_name: String,
    pub to_name: Option<String>,
    pub text: String,
    #[serde(default)]
    pub color: Option<DisplayHint>,
    #[serde(default)]
    pub action: Option<Action>,
    pub timestamp: String,
}

impl Envelope {
    /// A plain chat message as a client composes it.
    ///
    /// The sender id is left unset; the server stamps it from the
    /// session that delivered the frame.
    pub fn chat(sender_name: &str, to_name: Option<&str>, text: &str) -> Self {
        Self {
            sender_id: None,
            sender_name: sender_name.to_string(),
            to_name: to_name.map(str::to_string),
            text: text.to_string(),
            color: to_name.map(|_| DisplayHint::Whisper),
            action: None,
            timestamp: timestamp_now(),
        }
    }

    /// A server-originated announcement with no control code.
    pub fn server_notice(text: &str) -> Self {
        Self {
            sender_id: None,
            sender_name: SERVER_NAME.to_string(),
            to_name: None,
            text: text.to_string(),
            color: Some(DisplayHint::Default),
            action: None,
            timestamp: timestamp_now(),
        }
    }

    /// Broadcast notice that `name` completed its handshake.
    pub fn joined_notice(name: &str) -> Self {
        Self {
            color: Some(DisplayHint::Joined),
            action: Some(Action::Joined),
            ..Self::server_notice(&format!("{name} has connected!"))
        }
    }

    /// Broadcast notice that `name` disconnected.
    pub fn left_notice(name: &str) -> Self {
        Self {
            action: Some(Action::Left),
            ..Self::server_notice(&format!("{name} has disconnected!"))
        }
    }

    /// Broadcast notice that `name` was removed by the operator.
    pub fn kicked_notice(name: &str) -> Self {
        Self {
            action: Some(Action::Kicked),
            ..Self::server_notice(&format!("{name} was kicked from the server!"))
        }
    }

    /// Envelope addressed to the kick victim itself.
    ///
    /// `to_name` carries the victim's own name so a client can tell the
    /// direct notice apart from the broadcast one.
    pub fn kicked(name: &str) -> Self {
        Self {
            to_name: Some(name.to_string()),
            action: Some(Action::Kicked),
            ..Self::server_notice("You have been kicked from the server.")
        }
    }

    /// Handshake rejection for an empty or duplicate display name.
    pub fn name_error(name: &str) -> Self {
        Self {
            to_name: Some(name.to_string()),
            action: Some(Action::NameError),
            ..Self::server_notice(&format!("The name '{name}' is not available."))
        }
    }

    /// Reply to a `/list` request.
    pub fn user_list(names: &[String]) -> Self {
        Self::server_notice(&format!("Users: {}", names.join(" ")))
    }

    /// Whether this envelope is a `/list` request.
    pub fn is_list_request(&self) -> bool {
        self.text == "/list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_field_names() {
        let mut env = Envelope::chat("alice", None, "hi");
        env.sender_id = Some(SessionId(0));
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"senderId\":0"));
        assert!(json.contains("\"senderName\":\"alice\""));
        assert!(json.contains("\"toName\":null"));
        assert!(json.contains("\"text\":\"hi\""));
        assert!(json.contains("\"action\":null"));
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(u8::from(Action::Joined), 1);
        assert_eq!(u8::from(Action::Left), 2);
        assert_eq!(u8::from(Action::Kicked), 3);
        assert_eq!(u8::from(Action::NameError), 4);
        assert!(Action::try_from(5).is_err());
    }

    #[test]
    fn test_action_serializes_as_integer() {
        let env = Envelope::kicked_notice("bob");
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"action\":3"));
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, Some(Action::Kicked));
    }

    #[test]
    fn test_missing_hint_and_action_decode_as_none() {
        let json = r#"{"senderId":null,"senderName":"bob","toName":"alice",
                       "text":"hello","timestamp":"[12:00:00]"}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.sender_id, None);
        assert_eq!(env.to_name.as_deref(), Some("alice"));
        assert_eq!(env.color, None);
        assert_eq!(env.action, None);
    }

    #[test]
    fn test_handshake_round_trip() {
        let hs = Handshake::greeting(SessionId(3), 2, "welcome banner");
        let json = serde_json::to_string(&hs).unwrap();
        assert!(json.contains("\"usersOnline\":2"));
        assert!(json.contains("\"header\":\"welcome banner\""));

        let back: Handshake = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, SessionId(3));
        assert_eq!(back.text, WELCOME_TEXT);
        assert!(back.name.is_empty());

        let named = back.with_name("alice");
        assert_eq!(named.name, "alice");
    }

    #[test]
    fn test_list_request_detection() {
        assert!(Envelope::chat("a", None, "/list").is_list_request());
        assert!(!Envelope::chat("a", None, "/list please").is_list_request());
    }

    #[test]
    fn test_user_list_format() {
        let names = vec!["alice".to_string(), "bob".to_string()];
        let env = Envelope::user_list(&names);
        assert_eq!(env.text, "Users: alice bob");
        assert_eq!(env.sender_name, SERVER_NAME);
    }
}
