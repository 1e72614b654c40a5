use std::{sync::Arc, time::Duration};

use {
    linkrelay_config::TelegramConfig,
    linkrelay_links::{BrowserFallback, LinkPipeline},
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    handlers::{self, parse_recipient},
    state::RelayState,
};

const LONG_POLL_SECS: u32 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connect the bot and spawn the polling task.
///
/// The task handles updates one at a time and returns once `cancel` fires,
/// either from the caller or from the operator's `/stop`. A conflicting
/// poller on the same token also cancels it.
pub async fn start_polling(
    config: &TelegramConfig,
    pipeline: Arc<LinkPipeline>,
    browser: Option<Arc<dyn BrowserFallback>>,
    cancel: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    // Client timeout must outlast the long-poll timeout.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("start", "Show help"),
        BotCommand::new("test_browser", "Check the headless browser"),
        BotCommand::new("stop", "Stop the bot"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(
        username = ?bot_username,
        channel = %config.channel_id,
        browser = browser.is_some(),
        "telegram bot connected (webhook cleared)"
    );

    let state = RelayState {
        bot,
        bot_username,
        operator_id: config.operator_id,
        channel: parse_recipient(&config.channel_id),
        channel_mention: config.channel_mention().to_string(),
        pipeline,
        browser,
        cancel,
    };

    Ok(tokio::spawn(poll(state)))
}

async fn poll(state: RelayState) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = state
            .bot
            .get_updates()
            .offset(offset)
            .timeout(LONG_POLL_SECS)
            .allowed_updates(vec![AllowedUpdate::Message])
            .send();

        let result = tokio::select! {
            () = state.cancel.cancelled() => break,
            result = request => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if let Err(e) = handlers::handle_message(msg, &state).await {
                                error!(error = %e, "error handling telegram message");
                            }
                        },
                        other => debug!("ignoring non-message update: {other:?}"),
                    }
                    if state.cancel.is_cancelled() {
                        break;
                    }
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling disabled: another instance is running with this token");
                state.cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = state.cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {},
                }
            },
        }
    }

    acknowledge(&state.bot, offset).await;
    info!("telegram polling stopped");
}

/// Confirm handled updates so a restart does not see them again (a `/stop`
/// in particular).
async fn acknowledge(bot: &Bot, offset: i32) {
    if offset == 0 {
        return;
    }
    let ack = bot.get_updates().offset(offset).timeout(0).limit(1).send();
    match tokio::time::timeout(RETRY_DELAY, ack).await {
        Ok(Ok(_)) => debug!(offset, "acknowledged handled updates"),
        Ok(Err(e)) => debug!(offset, error = %e, "failed to acknowledge updates"),
        Err(_) => debug!(offset, "timed out acknowledging updates"),
    }
}
