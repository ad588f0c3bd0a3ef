use std::env;
use std::sync::Arc;
use tether::prelude::*;
use tether::twilight_exports::InteractionResponseData;
use twilight_gateway::{Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;

fn feedback_modal() -> Modal {
    Modal::builder("Send feedback")
        .item(TextInput::short("Your name").custom_id("name").build().unwrap())
        .item(
            TextInput::paragraph("What do you think?")
                .custom_id("feedback")
                .placeholder("Write something nice")
                .max_length(1000)
                .build()
                .unwrap(),
        )
        .callback(|ctx: ModalContext| async move {
            let name = ctx.value("name").unwrap_or("Someone");
            let feedback = ctx.value("feedback").unwrap_or_default();
            ctx.respond(InteractionResponseData {
                content: Some(format!("{name} said: {feedback}")),
                ..Default::default()
            })
            .await?;
            Ok(())
        })
        .build()
        .unwrap()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let token = env::var("DISCORD_TOKEN").unwrap();
    let application_id = env::var("DISCORD_APPLICATION_ID").unwrap().parse::<u64>().unwrap();

    let http_client = Arc::new(HttpClient::new(token.clone()));
    let client = Client::http(Arc::clone(&http_client), Id::new(application_id)).build();

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
            Event::MessageCreate(message) if message.content == "!feedback" => {
                let view = View::new();
                view.add_item(
                    Button::builder().label("Open form").build().unwrap(),
                    |ctx: ViewContext, _| async move {
                        // Every modal gets a fresh custom id, so many users can fill it at once.
                        ctx.respond_with_modal(&feedback_modal()).await?;
                        Ok(())
                    },
                )
                .unwrap();

                let components = view.build();
                let sent = http_client
                    .create_message(message.channel_id)
                    .content("Tell us what you think!")
                    .components(&components)
                    .await
                    .unwrap()
                    .model()
                    .await
                    .unwrap();

                client.start_view(&view, Bind::Message(sent.id)).unwrap();
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
