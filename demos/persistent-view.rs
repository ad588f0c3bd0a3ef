use std::env;
use std::sync::Arc;
use tether::prelude::*;
use tether::twilight_exports::{InteractionResponseData, MessageFlags};
use twilight_gateway::{Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;

// Views whose items have explicit custom ids keep working after the bot restarts, as long
// as they are started again on startup.
fn role_panel() -> View {
    let view = View::builder().timeout(None).build();

    view.add_item(
        Button::builder().label("Yes").custom_id("poll:yes").build().unwrap(),
        |ctx: ViewContext, _| async move {
            ctx.respond(ephemeral("You voted yes")).await?;
            Ok(())
        },
    )
    .unwrap();

    view.add_item(
        Button::builder().label("No").custom_id("poll:no").build().unwrap(),
        |ctx: ViewContext, _| async move {
            ctx.respond(ephemeral("You voted no")).await?;
            Ok(())
        },
    )
    .unwrap();

    view
}

fn ephemeral(content: &str) -> InteractionResponseData {
    InteractionResponseData {
        content: Some(content.to_owned()),
        flags: Some(MessageFlags::EPHEMERAL),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let token = env::var("DISCORD_TOKEN").unwrap();
    let application_id = env::var("DISCORD_APPLICATION_ID").unwrap().parse::<u64>().unwrap();

    let http_client = Arc::new(HttpClient::new(token.clone()));
    let client = Client::http(Arc::clone(&http_client), Id::new(application_id)).build();

    let panel = role_panel();
    client.start_view(&panel, Bind::Unbound).unwrap();

    let mut shard = Shard::new(
        ShardId::ONE,
        token,
        Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT,
    );

    loop {
        let event = match shard.next_event().await {
            Ok(event) => event,
            Err(source) => {
                tracing::warn!(?source, "error receiving event");
                if source.is_fatal() {
                    break;
                }
                continue;
            }
        };

        match event {
            Event::MessageCreate(message) if message.content == "!poll" => {
                let components = panel.build();
                http_client
                    .create_message(message.channel_id)
                    .content("Do you like tether?")
                    .components(&components)
                    .await
                    .unwrap();
            }
            Event::InteractionCreate(interaction) => {
                if let Err(error) = client.process(interaction.0).await {
                    tracing::warn!("Failed to process interaction: {}", error);
                }
            }
            _ => (),
        }
    }
}
