//! Parsing of typed user commands.
//!
//! A line is split on `:`. The first part picks the command:
//!
//! | Input                       | Command                          |
//! |-----------------------------|----------------------------------|
//! | `list:`                     | roster request                   |
//! | `leave:`                    | leave the chat                   |
//! | `exit:`                     | shut the server down             |
//! | `creategroup:<group>`       | create a group                   |
//! | `addtogroup:<group>:<user>` | add a user to a group            |
//! | `groupmsg:<group>:<text>`   | message a group                  |
//! | `<user>:<text>`             | direct message                   |
//! | `<text>` (no colon)         | broadcast                        |
//!
//! Group message text is the remaining parts joined with spaces. Direct
//! message text keeps any further colons.

use gabble_protocol::ChatMessage;

/// One parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Leave,
    Exit,
    CreateGroup { group: String },
    AddToGroup { group: String, user: String },
    GroupMessage { group: String, text: String },
    Direct { recipient: String, text: String },
    Broadcast(String),
}

impl Command {
    /// Parses one input line.
    ///
    /// Returns `None` for an empty line and for a keyword command missing
    /// a required part (`creategroup:` with no group, `addtogroup:g` with
    /// no user).
    pub fn parse(line: &str) -> Option<Self> {
        if line.is_empty() {
            return None;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() == 1 {
            return Some(Self::Broadcast(line.to_owned()));
        }

        let command = match parts[0] {
            "list" => Self::List,
            "leave" => Self::Leave,
            "exit" => Self::Exit,
            "creategroup" => {
                let group = non_empty(parts[1])?;
                Self::CreateGroup { group }
            }
            "addtogroup" => {
                let group = non_empty(parts[1])?;
                let user = non_empty(parts.get(2).copied().unwrap_or_default())?;
                Self::AddToGroup { group, user }
            }
            "groupmsg" if parts.len() >= 3 => Self::GroupMessage {
                group: parts[1].to_owned(),
                text: parts[2..].join(" "),
            },
            recipient => Self::Direct {
                recipient: recipient.to_owned(),
                text: parts[1..].join(":"),
            },
        };
        Some(command)
    }

    /// Builds the wire message for this command, sent as `username`.
    pub fn into_message(self, username: &str) -> ChatMessage {
        match self {
            Self::List => ChatMessage::list(""),
            Self::Leave => ChatMessage::leave(),
            Self::Exit => ChatMessage::exit(),
            Self::CreateGroup { group } => ChatMessage::create_group(&group, username),
            Self::AddToGroup { group, user } => ChatMessage::add_to_group(&group, &user),
            Self::GroupMessage { group, text } => {
                ChatMessage::group_message(&group, username, &text)
            }
            Self::Direct { recipient, text } => {
                ChatMessage::direct_message_to(username, &recipient, &text)
            }
            Self::Broadcast(text) => ChatMessage::broadcast(username, &text),
        }
    }
}

fn non_empty(part: &str) -> Option<String> {
    (!part.is_empty()).then(|| part.to_owned())
}
