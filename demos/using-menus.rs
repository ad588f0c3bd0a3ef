use std::env;
use std::sync::Arc;
use tether::prelude::*;
use twilight_gateway::{Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;

fn settings_screen() -> Screen {
    Screen::builder("settings")
        .content(ScreenContent::new().content("Pick what to change"))
        .item(
            Select::text(vec![
                SelectOption::new("Light").value("light"),
                SelectOption::new("Dark").value("dark"),
            ])
            .placeholder("Theme")
            .build()
            .unwrap(),
            |ctx: MenuContext, item| async move {
                let theme = item
                    .as_select()
                    .and_then(|select| select.values().first().cloned())
                    .unwrap_or_default();
                ctx.menu()
                    .update_message(Some(
                        ScreenContent::new().content(format!("Theme set to {theme}")),
                    ))
                    .await?;
                Ok(())
            },
        )
        .item(
            Button::builder().label("Back").build().unwrap(),
            |ctx: MenuContext, _| async move {
                ctx.menu().pop().await?;
                Ok(())
            },
        )
        .on_dispose(|| async {
            tracing::info!("Leaving the settings screen");
            Ok(())
        })
        .build()
        .unwrap()
}

fn main_screen() -> Screen {
    Screen::builder("main")
        .content(ScreenContent::new().content("Welcome to the control panel"))
        .item(
            Button::builder().label("Settings").build().unwrap(),
            |ctx: MenuContext, _| async move {
                ctx.menu().push(settings_screen()).await?;
                Ok(())
            },
        )
        .item(
            Button::builder().label("Close").build().unwrap(),
            |ctx: MenuContext, _| async move {
                ctx.menu().view().set_disabled_all(true);
                ctx.menu().update_message(None).await?;
                ctx.menu().view().stop();
                Ok(())
            },
        )
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

    // A persistent launcher, menus are sent in response to it.
    let launcher = View::builder().timeout(None).build();
    launcher
        .add_item(
            Button::builder().label("Open panel").custom_id("panel:open").build().unwrap(),
            |ctx: ViewContext, _| async move {
                Menu::builder()
                    .build()
                    .send(ctx.context(), main_screen(), true)
                    .await?;
                Ok(())
            },
        )
        .unwrap();
    launcher
        .add_item(
            Button::builder().label("Browse").custom_id("panel:browse").build().unwrap(),
            |ctx: ViewContext, _| async move {
                let mut paginator = Paginator::new(200).prefix("```\n").suffix("```");
                for number in 1..=60 {
                    paginator.add_line(&format!("Entry number {number}"))?;
                }

                let navigator = Navigator::builder(paginator.pages())
                    .buttons([
                        NavButton::Prev,
                        NavButton::Indicator,
                        NavButton::Next,
                        NavButton::Stop,
                    ])
                    .bare_item(
                        Button::link("https://docs.rs/twilight-model")
                            .label("Docs")
                            .build()?,
                    )
                    .build()?;
                navigator.send(ctx.context(), true).await?;
                Ok(())
            },
        )
        .unwrap();
    client.start_view(&launcher, Bind::Unbound).unwrap();

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
            Event::MessageCreate(message) if message.content == "!panel" => {
                let components = launcher.build();
                http_client
                    .create_message(message.channel_id)
                    .content("Control panel")
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
