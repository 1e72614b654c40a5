use {
    linkrelay_links::LinkAnnotation,
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{MessageEntity, MessageEntityKind, Recipient},
    },
    tracing::{debug, error, info, warn},
};

use crate::{access, state::RelayState};

pub const PERMISSION_DENIED: &str = "You don't have permission to use this bot.";
pub const DELIVERED: &str = "Message successfully sent to channel!";
pub const STOPPING: &str = "Stopping the bot... Goodbye!";

/// Page loaded by `/test_browser`.
pub const BROWSER_TEST_URL: &str = "https://www.google.com";

const HELP_TEXT: &str = "Hi! Send me a message with a link and I'll process it for the channel.\n\n\
Commands:\n\
/test_browser - check the headless browser\n\
/stop - stop the bot (admin only)";

/// Bot commands understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    TestBrowser,
    Stop,
}

/// What an inbound text turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    /// A slash command this bot does not know, or one addressed to another bot.
    UnknownCommand,
    Text,
}

/// Classify a message body. Commands may carry a `@botname` suffix.
pub fn classify(text: &str, bot_username: Option<&str>) -> Inbound {
    let Some(rest) = text.trim_start().strip_prefix('/') else {
        return Inbound::Text;
    };
    let word = rest.split_whitespace().next().unwrap_or_default();
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };

    if let Some(target) = target
        && !bot_username.is_some_and(|me| me.eq_ignore_ascii_case(target))
    {
        return Inbound::UnknownCommand;
    }

    match name {
        "start" | "help" => Inbound::Command(Command::Start),
        "test_browser" => Inbound::Command(Command::TestBrowser),
        "stop" => Inbound::Command(Command::Stop),
        _ => Inbound::UnknownCommand,
    }
}

/// Map Telegram entities to link annotations. Only `text_link` and `url`
/// entities matter; offsets stay in UTF-16 code units.
pub fn annotations_from_entities(entities: &[MessageEntity]) -> Vec<LinkAnnotation> {
    entities
        .iter()
        .filter_map(|entity| match &entity.kind {
            MessageEntityKind::TextLink { url } => Some(LinkAnnotation::ExplicitUrl {
                url: url.to_string(),
                offset: entity.offset,
                length: entity.length,
            }),
            MessageEntityKind::Url => Some(LinkAnnotation::InlineUrlMention {
                offset: entity.offset,
                length: entity.length,
            }),
            _ => None,
        })
        .collect()
}

/// Parse the configured channel: a numeric chat id or a public `@username`.
pub fn parse_recipient(channel_id: &str) -> Recipient {
    let channel_id = channel_id.trim();
    match channel_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel_id.starts_with('@') => Recipient::ChannelUsername(channel_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel_id}")),
    }
}

/// Handle one inbound message from the polling loop.
pub async fn handle_message(msg: Message, state: &RelayState) -> crate::Result<()> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without text");
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let sender = msg.from.as_ref().map(|u| u.id.0);

    let inbound = classify(text, state.bot_username.as_deref());
    match inbound {
        Inbound::Command(Command::Start) => return reply(state, chat_id, HELP_TEXT).await,
        Inbound::UnknownCommand => {
            debug!(chat_id = chat_id.0, "ignoring unknown command");
            return Ok(());
        },
        Inbound::Command(_) | Inbound::Text => {},
    }

    if let Err(reason) = access::check_operator(state.operator_id, sender) {
        warn!(chat_id = chat_id.0, ?sender, %reason, "rejecting message");
        return reply(state, chat_id, PERMISSION_DENIED).await;
    }

    match inbound {
        Inbound::Command(Command::TestBrowser) => test_browser(state, chat_id).await,
        Inbound::Command(Command::Stop) => {
            info!("stop requested by operator");
            reply(state, chat_id, STOPPING).await?;
            state.cancel.cancel();
            Ok(())
        },
        _ => relay(&msg, text, state).await,
    }
}

async fn relay(msg: &Message, text: &str, state: &RelayState) -> crate::Result<()> {
    let chat_id = msg.chat.id;
    let entities = msg
        .entities()
        .or_else(|| msg.caption_entities())
        .unwrap_or_default();
    let annotations = annotations_from_entities(entities);
    info!(
        chat_id = chat_id.0,
        annotations = annotations.len(),
        "processing operator message"
    );

    let processed = match state
        .pipeline
        .process(text, &annotations, &state.channel_mention)
        .await
    {
        Ok(processed) => processed,
        Err(failure) => {
            info!(%failure, "nothing posted");
            return reply(state, chat_id, &failure.to_string()).await;
        },
    };

    let posted = state
        .bot
        .send_message(state.channel.clone(), processed.render())
        .disable_notification(true)
        .await;
    match posted {
        Ok(_) => {
            info!(
                url = %processed.normalized_url,
                method = %processed.resolution.method,
                "posted to channel"
            );
            reply(state, chat_id, DELIVERED).await
        },
        Err(e) => {
            error!(error = %e, "failed to post to channel");
            reply(state, chat_id, &format!("An error occurred: {e}")).await
        },
    }
}

async fn test_browser(state: &RelayState, chat_id: ChatId) -> crate::Result<()> {
    let text = match &state.browser {
        Some(browser) => {
            let result = browser.resolve_with_browser(BROWSER_TEST_URL).await;
            format!("Browser works!\nTest URL: {BROWSER_TEST_URL}\nResult: {result}")
        },
        None => "Browser is not available, links are resolved over HTTP only.".to_string(),
    };
    reply(state, chat_id, &text).await
}

async fn reply(state: &RelayState, chat_id: ChatId, text: &str) -> crate::Result<()> {
    state.bot.send_message(chat_id, text).await?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use {
        async_trait::async_trait,
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        linkrelay_links::{
            BrowserFallback, LinkPipeline, LinkResolver, Resolution, ResolutionMethod,
        },
        rstest::rstest,
        serde::Deserialize,
        serde_json::{Value, json},
        tokio::sync::oneshot,
        tokio_util::sync::CancellationToken,
    };

    use super::*;

    #[rstest]
    #[case("/start", Inbound::Command(Command::Start))]
    #[case("/help", Inbound::Command(Command::Start))]
    #[case("/test_browser", Inbound::Command(Command::TestBrowser))]
    #[case("/stop now", Inbound::Command(Command::Stop))]
    #[case("/stop@relay_bot", Inbound::Command(Command::Stop))]
    #[case("/stop@Relay_Bot", Inbound::Command(Command::Stop))]
    #[case("/stop@other_bot", Inbound::UnknownCommand)]
    #[case("/new", Inbound::UnknownCommand)]
    #[case("useful: https://example.com", Inbound::Text)]
    #[case("see /stop later", Inbound::Text)]
    fn classifies_commands(#[case] text: &str, #[case] expected: Inbound) {
        assert_eq!(classify(text, Some("relay_bot")), expected);
    }

    #[test]
    fn entities_map_to_annotations() {
        let entities = vec![
            MessageEntity {
                kind: MessageEntityKind::Bold,
                offset: 0,
                length: 4,
            },
            MessageEntity {
                kind: MessageEntityKind::TextLink {
                    url: reqwest::Url::parse("https://example.com/a?b=1").unwrap(),
                },
                offset: 5,
                length: 5,
            },
            MessageEntity {
                kind: MessageEntityKind::Url,
                offset: 12,
                length: 19,
            },
        ];

        assert_eq!(annotations_from_entities(&entities), vec![
            LinkAnnotation::ExplicitUrl {
                url: "https://example.com/a?b=1".into(),
                offset: 5,
                length: 5,
            },
            LinkAnnotation::InlineUrlMention {
                offset: 12,
                length: 19,
            },
        ]);
    }

    #[rstest]
    #[case("-1001234567890", Recipient::Id(ChatId(-1001234567890)))]
    #[case(" 42 ", Recipient::Id(ChatId(42)))]
    #[case("@links", Recipient::ChannelUsername("@links".into()))]
    #[case("links", Recipient::ChannelUsername("@links".into()))]
    fn parses_channel_recipient(#[case] raw: &str, #[case] expected: Recipient) {
        assert_eq!(parse_recipient(raw), expected);
    }

    // Minimal Bot API stand-in that records every sendMessage call.

    #[derive(Debug, Clone, Deserialize)]
    struct SentMessage {
        chat_id: Value,
        text: String,
        #[serde(default)]
        disable_notification: Option<bool>,
    }

    #[derive(Clone, Default)]
    struct MockTelegramApi {
        sent: Arc<Mutex<Vec<SentMessage>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<Value> {
        let method = uri.path().rsplit('/').next().unwrap_or_default();
        if method.eq_ignore_ascii_case("sendmessage") {
            let sent: SentMessage = serde_json::from_slice(&body).expect("sendMessage body");
            let chat_id = sent.chat_id.as_i64().unwrap_or(-1);
            let text = sent.text.clone();
            state.sent.lock().unwrap().push(sent);
            return Json(json!({
                "ok": true,
                "result": {
                    "message_id": 1,
                    "date": 1,
                    "chat": { "id": chat_id, "type": "private" },
                    "text": text,
                }
            }));
        }
        Json(json!({ "ok": true, "result": true }))
    }

    struct MockServer {
        api: MockTelegramApi,
        url: reqwest::Url,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl MockServer {
        async fn start() -> Self {
            let api = MockTelegramApi::default();
            let app = Router::new()
                .route("/{*path}", post(telegram_api_handler))
                .with_state(api.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind test listener");
            let addr = listener.local_addr().expect("local addr");
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("serve mock telegram api");
            });
            let url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
            Self {
                api,
                url,
                shutdown: Some(shutdown_tx),
            }
        }

        fn sent(&self) -> Vec<SentMessage> {
            self.api.sent.lock().unwrap().clone()
        }
    }

    impl Drop for MockServer {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LinkResolver for CountingResolver {
        async fn resolve(&self, url: &str) -> Resolution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Resolution::new(url, ResolutionMethod::Direct)
        }
    }

    struct FixedBrowser;

    #[async_trait]
    impl BrowserFallback for FixedBrowser {
        async fn resolve_with_browser(&self, _url: &str) -> String {
            "https://www.google.com/".to_string()
        }
    }

    const OPERATOR: u64 = 1001;
    const CHANNEL: i64 = -1_001_234_567_890;

    fn relay_state(
        server: &MockServer,
        resolver: Arc<CountingResolver>,
        browser: Option<Arc<dyn BrowserFallback>>,
    ) -> RelayState {
        RelayState {
            bot: Bot::new("test-token").set_api_url(server.url.clone()),
            bot_username: Some("relay_bot".into()),
            operator_id: OPERATOR,
            channel: Recipient::Id(ChatId(CHANNEL)),
            channel_mention: "links".into(),
            pipeline: Arc::new(LinkPipeline::new(resolver)),
            browser,
            cancel: CancellationToken::new(),
        }
    }

    fn message(from: u64, text: &str, entities: Value) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Op" },
            "from": { "id": from, "is_bot": false, "first_name": "Op" },
            "text": text,
            "entities": entities,
        }))
        .expect("deserialize text message")
    }

    #[tokio::test]
    async fn non_operator_is_rejected_before_pipeline() {
        let server = MockServer::start().await;
        let resolver = Arc::new(CountingResolver::default());
        let state = relay_state(&server, resolver.clone(), None);

        let msg = message(7, "useful: https://example.com/a", json!([]));
        handle_message(msg, &state).await.expect("handle message");

        let sent = server.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, json!(42));
        assert_eq!(sent[0].text, PERMISSION_DENIED);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn operator_link_is_posted_silently_then_confirmed() {
        let server = MockServer::start().await;
        let resolver = Arc::new(CountingResolver::default());
        let state = relay_state(&server, resolver.clone(), None);

        let text = "useful: https://example.com/a?x=1";
        let msg = message(
            OPERATOR,
            text,
            json!([{ "type": "url", "offset": 8, "length": 25 }]),
        );
        handle_message(msg, &state).await.expect("handle message");

        let sent = server.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chat_id, json!(CHANNEL));
        assert_eq!(
            sent[0].text,
            "useful:\n\nhttps://example.com/a\n\n@links\n#useful"
        );
        assert_eq!(sent[0].disable_notification, Some(true));
        assert_eq!(sent[1].chat_id, json!(42));
        assert_eq!(sent[1].text, DELIVERED);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn message_without_link_is_not_posted() {
        let server = MockServer::start().await;
        let state = relay_state(&server, Arc::new(CountingResolver::default()), None);

        let msg = message(OPERATOR, "useful: nothing here", json!([]));
        handle_message(msg, &state).await.expect("handle message");

        let sent = server.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, json!(42));
        assert_eq!(sent[0].text, "No link found in message");
    }

    #[tokio::test]
    async fn start_is_answered_for_anyone() {
        let server = MockServer::start().await;
        let state = relay_state(&server, Arc::new(CountingResolver::default()), None);

        handle_message(message(7, "/start", json!([])), &state)
            .await
            .expect("handle message");

        let sent = server.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("/test_browser"));
    }

    #[tokio::test]
    async fn stop_cancels_for_operator_only() {
        let server = MockServer::start().await;
        let state = relay_state(&server, Arc::new(CountingResolver::default()), None);

        handle_message(message(7, "/stop", json!([])), &state)
            .await
            .expect("handle message");
        assert!(!state.cancel.is_cancelled());

        handle_message(message(OPERATOR, "/stop", json!([])), &state)
            .await
            .expect("handle message");
        assert!(state.cancel.is_cancelled());

        let texts: Vec<String> = server.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec![PERMISSION_DENIED.to_string(), STOPPING.to_string()]);
    }

    #[tokio::test]
    async fn test_browser_reports_availability() {
        let server = MockServer::start().await;
        let without = relay_state(&server, Arc::new(CountingResolver::default()), None);
        handle_message(message(OPERATOR, "/test_browser", json!([])), &without)
            .await
            .expect("handle message");

        let with = relay_state(
            &server,
            Arc::new(CountingResolver::default()),
            Some(Arc::new(FixedBrowser) as Arc<dyn BrowserFallback>),
        );
        handle_message(message(OPERATOR, "/test_browser", json!([])), &with)
            .await
            .expect("handle message");

        let sent = server.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.contains("not available"));
        assert!(sent[1].text.contains("Result: https://www.google.com/"));
    }
}
