use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::Value;
use tracing::debug;

use crate::envelope;
use crate::error::{Error, Result};
use crate::types::{
    Audio, ChatAction, ChatId, Document, InputFile, Location, Message, ParseMode, SendOptions,
    Sticker, User, Venue, Video, Voice,
};

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Outbound side of the Bot API.
///
/// Holds no mutable state; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Api {
    client: reqwest::Client,
    endpoint: String,
}

impl Api {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Points the client at another server, e.g. a local Bot API server or a
    /// mock in tests.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    /// Posts a form-encoded request and classifies the response envelope.
    async fn post_form(&self, method: &str, fields: &[(&str, String)]) -> Result<Option<Value>> {
        debug!("Calling {} with {} field(s)", method, fields.len());
        let response = self
            .client
            .post(self.method_url(method))
            .form(fields)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn post_multipart(&self, method: &str, form: Form) -> Result<Option<Value>> {
        debug!("Calling {} with multipart body", method);
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;
        read_envelope(response).await
    }

    /// Resolves the identity of the bot owning the token.
    pub async fn get_me(&self) -> Result<User> {
        debug!("Calling getMe");
        let response = self
            .client
            .post(self.method_url("getMe"))
            .form(&[] as &[(&str, String)])
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        envelope::classify_as(status, &body)
    }

    /// Registers `url` as the webhook the remote service pushes updates to.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        self.post_form("setWebhook", &[("url", url.to_string())]).await?;
        Ok(())
    }

    /// Sends a text message. `preview` controls link previews; the wire
    /// field is its negation.
    pub async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        mode: ParseMode,
        preview: bool,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        let mut fields = vec![
            ("chat_id", chat.to_string()),
            ("text", text.to_string()),
            ("parse_mode", mode.as_str().to_string()),
            ("disable_web_page_preview", (!preview).to_string()),
        ];
        push_options(&mut fields, opts)?;
        self.post_form("sendMessage", &fields).await?;
        Ok(())
    }

    /// Uploads a photo fetched from a remote URL.
    ///
    /// Photos already stored on Telegram's servers and local files are not
    /// supported and fail before any network call.
    pub async fn send_photo(
        &self,
        chat: ChatId,
        photo: &InputFile,
        caption: &str,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        let url = match photo {
            InputFile::Url(url) => url,
            InputFile::FileId(_) => {
                return Err(Error::UnsupportedSource(
                    "files residing on Telegram servers can not be sent",
                ))
            }
            InputFile::Path(_) => {
                return Err(Error::UnsupportedSource("local files can not be sent"))
            }
        };

        let unreachable = |source: reqwest::Error| Error::FetchUnreachable {
            url: url.clone(),
            source,
        };
        let fetched = self.client.get(url).send().await.map_err(unreachable)?;
        let status = fetched.status();
        if !status.is_success() {
            return Err(Error::FetchFailed {
                status,
                url: url.clone(),
            });
        }
        let bytes = fetched.bytes().await.map_err(unreachable)?;
        debug!("Fetched photo from {} ({} bytes)", url, bytes.len());

        let part = Part::bytes(bytes.to_vec()).file_name("image.jpg");

        let mut fields = vec![("chat_id", chat.to_string())];
        if !caption.is_empty() {
            fields.push(("caption", caption.to_string()));
        }
        push_options(&mut fields, opts)?;

        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("photo", part);

        self.post_multipart("sendPhoto", form).await?;
        Ok(())
    }

    pub async fn send_location(
        &self,
        chat: ChatId,
        location: Location,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        let mut fields = vec![
            ("chat_id", chat.to_string()),
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
        ];
        push_options(&mut fields, opts)?;
        self.post_form("sendLocation", &fields).await?;
        Ok(())
    }

    pub async fn send_venue(
        &self,
        chat: ChatId,
        venue: &Venue,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        let mut fields = vec![
            ("chat_id", chat.to_string()),
            ("latitude", venue.location.latitude.to_string()),
            ("longitude", venue.location.longitude.to_string()),
            ("title", venue.title.clone()),
            ("address", venue.address.clone()),
        ];
        if let Some(id) = &venue.foursquare_id {
            fields.push(("foursquare_id", id.clone()));
        }
        push_options(&mut fields, opts)?;
        self.post_form("sendVenue", &fields).await?;
        Ok(())
    }

    /// Broadcasts what the bot is doing, e.g. typing or uploading a photo.
    pub async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> Result<()> {
        let fields = [
            ("chat_id", chat.to_string()),
            ("action", action.as_str().to_string()),
        ];
        self.post_form("sendChatAction", &fields).await?;
        Ok(())
    }

    pub async fn forward_message(&self, _chat: ChatId, _message: &Message) -> Result<()> {
        Err(Error::NotImplemented("forwardMessage"))
    }

    pub async fn send_audio(
        &self,
        _chat: ChatId,
        _audio: &Audio,
        _opts: Option<&SendOptions>,
    ) -> Result<()> {
        Err(Error::NotImplemented("sendAudio"))
    }

    pub async fn send_document(
        &self,
        _chat: ChatId,
        _document: &Document,
        _opts: Option<&SendOptions>,
    ) -> Result<()> {
        Err(Error::NotImplemented("sendDocument"))
    }

    pub async fn send_sticker(
        &self,
        _chat: ChatId,
        _sticker: &Sticker,
        _opts: Option<&SendOptions>,
    ) -> Result<()> {
        Err(Error::NotImplemented("sendSticker"))
    }

    pub async fn send_video(
        &self,
        _chat: ChatId,
        _video: &Video,
        _opts: Option<&SendOptions>,
    ) -> Result<()> {
        Err(Error::NotImplemented("sendVideo"))
    }

    pub async fn send_voice(
        &self,
        _chat: ChatId,
        _voice: &Voice,
        _opts: Option<&SendOptions>,
    ) -> Result<()> {
        Err(Error::NotImplemented("sendVoice"))
    }
}

/// Appends the optional reply id and reply markup fields. An unset markup
/// adds nothing.
fn push_options(
    fields: &mut Vec<(&'static str, String)>,
    opts: Option<&SendOptions>,
) -> Result<()> {
    let Some(opts) = opts else {
        return Ok(());
    };
    if let Some(id) = opts.reply_to_message_id {
        fields.push(("reply_to_message_id", id.to_string()));
    }
    if let Some(markup) = &opts.reply_markup {
        let json = serde_json::to_string(markup).map_err(Error::Encode)?;
        fields.push(("reply_markup", json));
    }
    Ok(())
}

async fn read_envelope(response: Response) -> Result<Option<Value>> {
    let status = response.status();
    let body = response.bytes().await?;
    envelope::classify(status, &body)
}
