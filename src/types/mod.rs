pub mod error;

use serde::{Deserialize, Serialize};

/// Outbound transport family for an account
///
/// Decides which send endpoint the router submits to and which credential
/// shape the server expects. Accounts stored before the type field existed
/// deserialize as `Gmail`, matching the historical behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    #[serde(rename = "gmail")]
    Gmail,
    #[serde(rename = "domain-smtp")]
    DomainSmtp,
    #[serde(rename = "generic-smtp")]
    GenericSmtp,
}

impl AccountType {
    /// Send endpoint path for this transport family
    pub fn send_path(&self) -> &'static str {
        match self {
            AccountType::Gmail => "/send-gmail-email",
            AccountType::DomainSmtp | AccountType::GenericSmtp => "/send-email",
        }
    }
}

/// A configured sending/receiving identity
///
/// Metadata only: the credential itself lives server-side and is never
/// present on this type. `has_password` records whether one is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    /// Secondary send-as addresses, duplicate-free, insertion-ordered
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub has_password: bool,
    /// Per-account mailbox store override; absent means the system default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox_endpoint: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
}

/// Fields for creating a new account
///
/// `app_password` is forwarded to the account service on the cloud push and
/// never written to the local cache.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub mailbox_endpoint: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub app_password: Option<String>,
}

/// Field-wise partial update for an existing account
///
/// Unset fields are preserved. Supplying `app_password` forwards the new
/// credential to the account service and marks the account as having one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub has_password: Option<bool>,
    #[serde(default)]
    pub mailbox_endpoint: Option<String>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub app_password: Option<String>,
}

/// Mailbox folders exposed by the store
///
/// `Starred` is a virtual filter over the starred flag across all folders,
/// not a physical folder on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    Inbox,
    Sent,
    Drafts,
    Starred,
    Archive,
    Trash,
}

impl Folder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::Inbox => "inbox",
            Folder::Sent => "sent",
            Folder::Drafts => "drafts",
            Folder::Starred => "starred",
            Folder::Archive => "archive",
            Folder::Trash => "trash",
        }
    }

    /// All folders in sidebar order
    pub fn all() -> [Folder; 6] {
        [
            Folder::Inbox,
            Folder::Sent,
            Folder::Drafts,
            Folder::Starred,
            Folder::Archive,
            Folder::Trash,
        ]
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Folder {
    type Err = error::MailError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "inbox" => Ok(Folder::Inbox),
            "sent" => Ok(Folder::Sent),
            "drafts" => Ok(Folder::Drafts),
            "starred" => Ok(Folder::Starred),
            "archive" => Ok(Folder::Archive),
            "trash" => Ok(Folder::Trash),
            other => Err(error::MailError::Parse(format!("Unknown folder: {}", other))),
        }
    }
}

/// A message header row as returned by the mailbox store list endpoint
///
/// List responses never carry bodies; those arrive only on a full fetch.
/// Flag columns come back as 0/1 integers from the store, so they go
/// through a tolerant serde helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub folder: String,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub to_address: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default, with = "flag_bool")]
    pub has_attachments: bool,
    #[serde(default, with = "flag_bool")]
    pub read: bool,
    #[serde(default, with = "flag_bool")]
    pub starred: bool,
    /// RFC 3339 timestamp string; parse with chrono when ordering matters
    pub received_at: String,
}

impl StoredMessage {
    /// Parsed receive time, if the store produced a valid timestamp
    pub fn received_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.received_at)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

/// A fully fetched message: header row plus lazily loaded bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullMessage {
    pub message: StoredMessage,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

/// Partial update applied to a stored message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl MessagePatch {
    pub fn read(value: bool) -> Self {
        Self {
            read: Some(value),
            ..Default::default()
        }
    }

    pub fn starred(value: bool) -> Self {
        Self {
            starred: Some(value),
            ..Default::default()
        }
    }

    pub fn move_to(folder: Folder) -> Self {
        Self {
            folder: Some(folder.as_str().to_string()),
            ..Default::default()
        }
    }
}

/// Outgoing send request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Explicit acting account; absent means the default account
    #[serde(default)]
    pub account_id: Option<String>,
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Send-as override (an alias of the acting account)
    #[serde(default)]
    pub from_email: Option<String>,
}

/// Structured outcome of a send or sync trigger; never an Err
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Serde helper for flag columns the store serializes as 0/1 integers
///
/// Accepts either an integer or a real boolean on the way in; writes the
/// integer form back out to match the store's row shape.
mod flag_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(i64),
        Bool(bool),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(i64::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Int(n) => Ok(n != 0),
            Flag::Bool(b) => Ok(b),
        }
    }
}
