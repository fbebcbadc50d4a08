use tracing::info;

use crate::api::Api;
use crate::error::Result;
use crate::types::{
    Audio, ChatAction, ChatId, Document, InputFile, Location, Message, ParseMode, SendOptions,
    Sticker, User, Venue, Video, Voice,
};
use crate::webhook::{self, Updates};

/// A Telegram bot: the API token plus the identity it resolves to.
///
/// Cloning is cheap and clones share the HTTP connection pool.
#[derive(Clone)]
pub struct Bot {
    api: Api,
    identity: User,
}

impl Bot {
    /// Creates a bot for the token given by BotFather and resolves its
    /// identity with `getMe`.
    pub async fn new(token: &str) -> Result<Self> {
        Self::with_api(Api::new(token)).await
    }

    pub async fn with_api(api: Api) -> Result<Self> {
        let identity = api.get_me().await?;
        info!(
            "Authorized as {} (@{}, id {})",
            identity.first_name,
            identity.username.as_deref().unwrap_or("-"),
            identity.id
        );
        Ok(Self { api, identity })
    }

    pub fn identity(&self) -> &User {
        &self.identity
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        self.api.set_webhook(url).await?;
        info!("Webhook set to {}", url);
        Ok(())
    }

    /// Starts a webhook listener on `addr` (`host:port`). Every call binds
    /// its own independent listener; nothing is registered process-wide.
    pub async fn listen(&self, addr: &str) -> Result<Updates> {
        webhook::listen(addr).await
    }

    pub async fn send_message(
        &self,
        chat: impl Into<ChatId>,
        text: &str,
        mode: ParseMode,
        preview: bool,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api
            .send_message(chat.into(), text, mode, preview, opts)
            .await
    }

    /// Sends a photo fetched from a remote URL. For example:
    ///
    /// ```no_run
    /// # async fn demo(bot: hookbot::Bot, chat: hookbot::ChatId) -> hookbot::Result<()> {
    /// let photo = hookbot::InputFile::url("http://i.imgur.com/6S9naG6.png");
    /// bot.send_photo(chat, &photo, "sample image", None).await
    /// # }
    /// ```
    pub async fn send_photo(
        &self,
        chat: impl Into<ChatId>,
        photo: &InputFile,
        caption: &str,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_photo(chat.into(), photo, caption, opts).await
    }

    pub async fn send_location(
        &self,
        chat: impl Into<ChatId>,
        location: Location,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_location(chat.into(), location, opts).await
    }

    pub async fn send_venue(
        &self,
        chat: impl Into<ChatId>,
        venue: &Venue,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_venue(chat.into(), venue, opts).await
    }

    pub async fn send_chat_action(
        &self,
        chat: impl Into<ChatId>,
        action: ChatAction,
    ) -> Result<()> {
        self.api.send_chat_action(chat.into(), action).await
    }

    pub async fn forward_message(&self, chat: impl Into<ChatId>, message: &Message) -> Result<()> {
        self.api.forward_message(chat.into(), message).await
    }

    pub async fn send_audio(
        &self,
        chat: impl Into<ChatId>,
        audio: &Audio,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_audio(chat.into(), audio, opts).await
    }

    pub async fn send_document(
        &self,
        chat: impl Into<ChatId>,
        document: &Document,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_document(chat.into(), document, opts).await
    }

    pub async fn send_sticker(
        &self,
        chat: impl Into<ChatId>,
        sticker: &Sticker,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_sticker(chat.into(), sticker, opts).await
    }

    pub async fn send_video(
        &self,
        chat: impl Into<ChatId>,
        video: &Video,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_video(chat.into(), video, opts).await
    }

    pub async fn send_voice(
        &self,
        chat: impl Into<ChatId>,
        voice: &Voice,
        opts: Option<&SendOptions>,
    ) -> Result<()> {
        self.api.send_voice(chat.into(), voice, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_get_me(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/botT/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 77, "first_name": "Echo", "username": "echo_bot"}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_identity_resolved_once() {
        let server = MockServer::start().await;
        mock_get_me(&server).await;

        let bot = Bot::with_api(Api::with_base_url("T", &server.uri()))
            .await
            .unwrap();
        let copy = bot.clone();
        assert_eq!(bot.identity().id, 77);
        assert_eq!(copy.identity().username.as_deref(), Some("echo_bot"));
    }

    #[tokio::test]
    async fn test_invalid_token_fails_construction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botT/getMe"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let result = Bot::with_api(Api::with_base_url("T", &server.uri())).await;
        match result {
            Err(err) => assert_eq!(err.to_string(), "Unauthorized (401)"),
            Ok(_) => panic!("construction should fail"),
        }
    }

    #[tokio::test]
    async fn test_set_webhook_repeated() {
        let server = MockServer::start().await;
        mock_get_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/botT/setWebhook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": true,
                "description": "Webhook was set"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let bot = Bot::with_api(Api::with_base_url("T", &server.uri()))
            .await
            .unwrap();
        for _ in 0..3 {
            bot.set_webhook("https://example.com/hook").await.unwrap();
        }
        assert_eq!(bot.identity().id, 77);
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let server = MockServer::start().await;
        mock_get_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/botT/sendMessage"))
            .and(body_string(
                "chat_id=42&text=ping&parse_mode=&disable_web_page_preview=true",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let bot = Bot::with_api(Api::with_base_url("T", &server.uri()))
            .await
            .unwrap();
        let mut updates = bot.listen("127.0.0.1:0").await.unwrap();
        let hook = format!("http://{}/", updates.local_addr());

        let delivery = tokio::spawn(async move {
            reqwest::Client::new()
                .post(hook)
                .body(
                    r#"{"update_id":1,"message":{"message_id":3,"chat":{"id":42},"text":"ping"}}"#,
                )
                .send()
                .await
                .unwrap()
                .status()
        });

        let message = updates.recv().await.unwrap();
        let text = message.text.as_deref().unwrap();
        bot.send_message(&message.chat, text, ParseMode::Plain, false, None)
            .await
            .unwrap();
        assert_eq!(delivery.await.unwrap(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_each_listen_is_independent() {
        let server = MockServer::start().await;
        mock_get_me(&server).await;
        let bot = Bot::with_api(Api::with_base_url("T", &server.uri()))
            .await
            .unwrap();

        let mut first = bot.listen("127.0.0.1:0").await.unwrap();
        let mut second = bot.listen("127.0.0.1:0").await.unwrap();
        assert_ne!(first.local_addr(), second.local_addr());

        let hook = format!("http://{}/", second.local_addr());
        let delivery = tokio::spawn(async move {
            reqwest::Client::new()
                .post(hook)
                .body(r#"{"update_id":1,"message":{"message_id":6}}"#)
                .send()
                .await
                .unwrap()
                .status()
        });

        assert_eq!(second.recv().await.unwrap().id, 6);
        assert_eq!(delivery.await.unwrap(), reqwest::StatusCode::OK);
        let stray = tokio::time::timeout(Duration::from_millis(200), first.recv()).await;
        assert!(stray.is_err());
    }

    #[tokio::test]
    async fn test_unimplemented_sends() {
        let server = MockServer::start().await;
        mock_get_me(&server).await;
        let bot = Bot::with_api(Api::with_base_url("T", &server.uri()))
            .await
            .unwrap();

        let err = bot
            .send_video(ChatId(1), &Video::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented("sendVideo")));
    }
}
