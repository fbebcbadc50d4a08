//! Client for the Telegram Bot API: webhook deliveries come in as a stream of
//! messages, sends go out as form or multipart posts.

pub mod api;
pub mod bot;
pub mod config;
pub mod envelope;
pub mod error;
pub mod types;
pub mod webhook;

pub use api::Api;
pub use bot::Bot;
pub use error::{Error, Result};
pub use types::{
    Audio, ChatAction, ChatId, Contact, Document, File, InputFile, KeyboardMarkup, Location,
    Message, ParseMode, Photo, ReplyMarkup, SendOptions, Sticker, Update, User, Venue, Video,
    Voice,
};
pub use webhook::Updates;
