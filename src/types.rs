//! Wire types of the Telegram Bot API.
//!
//! Inbound records are decoded leniently: a missing field falls back to its
//! default. The exceptions are `update_id`, `message` and `message_id`, which
//! every delivery must carry.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Conversation target of an outbound call (user or group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId(id)
    }
}

impl From<&User> for ChatId {
    fn from(user: &User) -> Self {
        ChatId(user.id)
    }
}

/// A Telegram user, bot or group chat.
///
/// The API sends users and group chats interchangeably in the `chat` field;
/// group chats are the ones carrying a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl User {
    /// Whether this record describes a group chat rather than a person.
    pub fn is_group_chat(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }
}

/// One webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "update_id")]
    pub id: i64,
    pub message: Message,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: i64,
    pub from: Option<User>,
    /// Unix time the message was sent.
    #[serde(default)]
    pub date: i64,
    /// User for private messages, group for group messages.
    #[serde(default)]
    pub chat: User,
    pub forward_from: Option<User>,
    pub forward_date: Option<i64>,
    /// The replied-to message never carries its own `reply_to_message`.
    #[serde(rename = "reply_to_message")]
    pub reply_to: Option<Box<Message>>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub audio: Option<Audio>,
    pub document: Option<Document>,
    #[serde(default, rename = "photo")]
    pub photos: Vec<Photo>,
    pub sticker: Option<Sticker>,
    pub video: Option<Video>,
    pub voice: Option<Voice>,
    pub contact: Option<Contact>,
    pub location: Option<Location>,
    pub venue: Option<Venue>,
    pub new_chat_participant: Option<User>,
    pub left_chat_participant: Option<User>,
    pub new_chat_title: Option<String>,
    #[serde(default)]
    pub new_chat_photo: Vec<Photo>,
    #[serde(default)]
    pub delete_chat_photo: bool,
    #[serde(default)]
    pub group_chat_created: bool,
}

impl Message {
    pub fn chat_id(&self) -> ChatId {
        self.chat.chat_id()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        if self.date == 0 {
            return None;
        }
        DateTime::from_timestamp(self.date, 0)
    }

    pub fn has_media(&self) -> bool {
        !self.photos.is_empty()
            || self.audio.is_some()
            || self.document.is_some()
            || self.sticker.is_some()
            || self.video.is_some()
            || self.voice.is_some()
            || self.contact.is_some()
            || self.location.is_some()
            || self.venue.is_some()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) if from.is_group_chat() => {
                write!(f, "From group: {:?}  ", from.title.as_deref().unwrap_or(""))?
            }
            Some(from) => write!(
                f,
                "From user: \"{} {} ({})\"  ",
                from.first_name,
                from.last_name.as_deref().unwrap_or(""),
                from.username.as_deref().unwrap_or("")
            )?,
            None => write!(f, "From unknown sender  ")?,
        }
        write!(f, "Message: {:?}", self.text.as_deref().unwrap_or(""))
    }
}

/// Fields shared by every file-backed record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

impl File {
    /// Whether the file already lives on Telegram's servers.
    pub fn exists(&self) -> bool {
        !self.file_id.is_empty()
    }
}

/// One size of a photo, or a file/sticker thumbnail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Photo {
    #[serde(flatten)]
    pub file: File,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audio {
    #[serde(flatten)]
    pub file: File,
    pub duration: u32,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub mime_type: Option<String>,
}

/// A general file, as opposed to photos and audio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(flatten)]
    pub file: File,
    pub file_name: Option<String>,
    #[serde(rename = "thumb")]
    pub thumbnail: Option<Photo>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sticker {
    #[serde(flatten)]
    pub file: File,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "thumb")]
    pub thumbnail: Option<Photo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    #[serde(flatten)]
    pub file: File,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    #[serde(rename = "thumb")]
    pub thumbnail: Option<Photo>,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
}

/// A voice note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Voice {
    #[serde(flatten)]
    pub file: File,
    pub duration: u32,
    pub mime_type: Option<String>,
}

/// A point on the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Venue {
    pub location: Location,
    pub title: String,
    pub address: String,
    pub foursquare_id: Option<String>,
}

/// A shared phone contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_id: Option<i64>,
}

/// Source of an outbound media file.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFile {
    /// A file already stored on Telegram's servers.
    FileId(String),
    /// A file fetched from a remote URL and uploaded by the client.
    Url(String),
    /// A file on the local filesystem.
    Path(PathBuf),
}

impl InputFile {
    pub fn url(url: impl Into<String>) -> Self {
        InputFile::Url(url.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    Markdown,
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Plain => "",
            ParseMode::Markdown => "markdown",
            ParseMode::Html => "HTML",
        }
    }
}

/// Activity broadcast to a chat while the bot prepares a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordAudio,
    UploadAudio,
    UploadDocument,
    FindLocation,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::Typing => "typing",
            ChatAction::UploadPhoto => "upload_photo",
            ChatAction::RecordVideo => "record_video",
            ChatAction::UploadVideo => "upload_video",
            ChatAction::RecordAudio => "record_audio",
            ChatAction::UploadAudio => "upload_audio",
            ChatAction::UploadDocument => "upload_document",
            ChatAction::FindLocation => "find_location",
        }
    }
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom keyboard shown in place of the client's letter keyboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyboardMarkup {
    pub keyboard: Vec<Vec<String>>,
    #[serde(rename = "resize_keyboard")]
    pub resize: bool,
    #[serde(rename = "one_time_keyboard")]
    pub one_time: bool,
    pub selective: bool,
}

impl KeyboardMarkup {
    pub fn new<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyboard: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            ..Self::default()
        }
    }

    pub fn resize(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn one_time(mut self) -> Self {
        self.one_time = true;
        self
    }

    pub fn selective(mut self) -> Self {
        self.selective = true;
        self
    }
}

/// Client UI instruction attached to a send.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMarkup {
    Keyboard(KeyboardMarkup),
    /// Hide the current custom keyboard and show the letter keyboard.
    HideKeyboard { selective: bool },
    /// Make the client display a reply interface, as if the user tapped "Reply".
    ForceReply { selective: bool },
}

impl Serialize for ReplyMarkup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReplyMarkup::Keyboard(keyboard) => keyboard.serialize(serializer),
            ReplyMarkup::HideKeyboard { selective } => {
                let mut s = serializer.serialize_struct("ReplyKeyboardHide", 2)?;
                s.serialize_field("hide_keyboard", &true)?;
                s.serialize_field("selective", selective)?;
                s.end()
            }
            ReplyMarkup::ForceReply { selective } => {
                let mut s = serializer.serialize_struct("ForceReply", 2)?;
                s.serialize_field("force_reply", &true)?;
                s.serialize_field("selective", selective)?;
                s.end()
            }
        }
    }
}

impl From<KeyboardMarkup> for ReplyMarkup {
    fn from(keyboard: KeyboardMarkup) -> Self {
        ReplyMarkup::Keyboard(keyboard)
    }
}

/// Optional extras for send operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// If the message is a reply, id of the original message.
    pub reply_to_message_id: Option<i64>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendOptions {
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn with_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_update_decodes() {
        let update: Update =
            serde_json::from_str(r#"{"update_id":1,"message":{"message_id":5,"text":"hello"}}"#)
                .unwrap();
        assert_eq!(update.id, 1);
        assert_eq!(update.message.id, 5);
        assert_eq!(update.message.text.as_deref(), Some("hello"));
        assert!(update.message.from.is_none());
        assert!(!update.message.has_media());
    }

    #[test]
    fn test_update_without_message_is_rejected() {
        assert!(serde_json::from_str::<Update>(r#"{"update_id":1}"#).is_err());
    }

    #[test]
    fn test_message_without_id_is_rejected() {
        let result = serde_json::from_str::<Update>(r#"{"update_id":1,"message":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_group_chat_detection() {
        let message: Message = serde_json::from_value(json!({
            "message_id": 9,
            "date": 1_441_645_532,
            "chat": {"id": -100, "title": "rustaceans"},
            "from": {"id": 7, "first_name": "Ferris", "username": "ferris"},
            "text": "hi all"
        }))
        .unwrap();
        assert!(message.chat.is_group_chat());
        assert!(!message.from.as_ref().unwrap().is_group_chat());
        assert_eq!(message.chat_id(), ChatId(-100));
        assert_eq!(message.time().unwrap().timestamp(), 1_441_645_532);
    }

    #[test]
    fn test_photo_sizes_flatten_file_fields() {
        let message: Message = serde_json::from_value(json!({
            "message_id": 3,
            "photo": [
                {"file_id": "small", "file_size": 1024, "width": 90, "height": 60},
                {"file_id": "large", "width": 900, "height": 600}
            ]
        }))
        .unwrap();
        assert_eq!(message.photos.len(), 2);
        assert!(message.photos[0].file.exists());
        assert_eq!(message.photos[0].file.file_size, Some(1024));
        assert_eq!(message.photos[1].width, 900);
        assert!(message.has_media());
    }

    #[test]
    fn test_message_display() {
        let message = Message {
            from: Some(User {
                id: 1,
                first_name: "Ada".to_string(),
                last_name: Some("Lovelace".to_string()),
                username: Some("ada".to_string()),
                title: None,
            }),
            text: Some("hello".to_string()),
            ..Message::default()
        };
        assert_eq!(
            message.to_string(),
            r#"From user: "Ada Lovelace (ada)"  Message: "hello""#
        );
    }

    #[test]
    fn test_reply_markup_shapes() {
        let keyboard = ReplyMarkup::from(KeyboardMarkup::new([["yes", "no"]]).one_time());
        assert_eq!(
            serde_json::to_value(&keyboard).unwrap(),
            json!({
                "keyboard": [["yes", "no"]],
                "resize_keyboard": false,
                "one_time_keyboard": true,
                "selective": false
            })
        );

        let hide = ReplyMarkup::HideKeyboard { selective: true };
        assert_eq!(
            serde_json::to_value(&hide).unwrap(),
            json!({"hide_keyboard": true, "selective": true})
        );

        let force = ReplyMarkup::ForceReply { selective: false };
        assert_eq!(
            serde_json::to_value(&force).unwrap(),
            json!({"force_reply": true, "selective": false})
        );
    }

    #[test]
    fn test_wire_tokens() {
        assert_eq!(ParseMode::Plain.as_str(), "");
        assert_eq!(ParseMode::Markdown.as_str(), "markdown");
        assert_eq!(ChatAction::Typing.as_str(), "typing");
        assert_eq!(ChatAction::FindLocation.to_string(), "find_location");
        assert_eq!(ChatId(42).to_string(), "42");
    }
}
