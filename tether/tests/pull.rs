mod common;

use std::time::Duration;

use common::{button, click, text, MockResponder};
use tether::{
    event::SubmittedField,
    prelude::*,
    twilight_exports::{Component, Id, InteractionResponseType, TwilightTextInput},
};

fn pull_client(responder: &MockResponder) -> Client {
    Client::builder(responder.clone())
        .transport(Transport::Pull)
        .build()
}

#[tokio::test]
async fn responses_are_handed_back() {
    let responder = MockResponder::default();
    let client = pull_client(&responder);

    let view = View::builder().timeout(None).build();
    view.add_item(button("ping"), |ctx: ViewContext, _| async move {
        ctx.respond(text("pong")).await?;
        ctx.respond(text("followup")).await?;
        Ok(())
    })
    .unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    let result = client.dispatch(click(1, "ping", 2)).await.unwrap();
    match result {
        ProcessResult::Responded(response) => {
            assert_eq!(response.kind, InteractionResponseType::ChannelMessageWithSource);
            assert_eq!(
                response.data.and_then(|data| data.content).as_deref(),
                Some("pong")
            );
        }
        other => panic!("expected a response, got {other:?}"),
    }

    // Only the followup goes through the responder.
    let sent = responder.wait_for(1).await;
    assert_eq!(sent.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn silent_callbacks_fail_after_the_window() {
    let responder = MockResponder::default();
    let client = pull_client(&responder);

    let view = View::builder().timeout(None).build();
    view.add_item(button("silent"), |_, _| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    })
    .unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    let started = tokio::time::Instant::now();
    let result = client.dispatch(click(1, "silent", 2)).await;

    assert_eq!(result, Err(ProcessError::NoResponseIssued));
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert!(responder.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn finished_callbacks_fail_early() {
    let responder = MockResponder::default();
    let client = pull_client(&responder);

    let view = View::builder().timeout(None).build();
    view.add_item(button("noop"), |_, _| async { Ok(()) }).unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    let started = tokio::time::Instant::now();
    let result = client.dispatch(click(1, "noop", 2)).await;

    assert_eq!(result, Err(ProcessError::NoResponseIssued));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn unknown_items_are_unhandled() {
    let responder = MockResponder::default();
    let client = pull_client(&responder);

    assert_eq!(
        client.dispatch(click(1, "nothing", 2)).await,
        Ok(ProcessResult::Unhandled)
    );
}

#[tokio::test]
async fn modals_can_be_pulled() {
    let responder = MockResponder::default();
    let client = pull_client(&responder);

    let modal = Modal::builder("Feedback")
        .custom_id("feedback")
        .item(
            TextInput::short("Name")
                .custom_id("name")
                .build()
                .unwrap(),
        )
        .callback(|ctx: ModalContext| async move {
            let name = ctx.value("name").unwrap_or("stranger").to_owned();
            ctx.respond(text(&format!("Thanks {name}"))).await?;
            Ok(())
        })
        .build()
        .unwrap();

    let view = View::builder().timeout(None).build();
    view.add_item(button("open"), move |ctx: ViewContext, _| {
        let modal = modal.clone();
        async move {
            ctx.respond_with_modal(&modal).await?;
            Ok(())
        }
    })
    .unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    let opened = client.dispatch(click(1, "open", 2)).await.unwrap();
    let ProcessResult::Responded(response) = opened else {
        panic!("expected the modal, got {opened:?}");
    };
    assert_eq!(response.kind, InteractionResponseType::Modal);
    let data = response.data.unwrap();
    assert_eq!(data.custom_id.as_deref(), Some("feedback"));
    assert_eq!(data.title.as_deref(), Some("Feedback"));
    assert!(matches!(
        data.components.as_deref(),
        Some([Component::ActionRow(row)]) if matches!(row.components.as_slice(), [Component::TextInput(TwilightTextInput { .. })])
    ));

    let submission = InteractionEvent::modal_submit(
        Id::new(3),
        Id::new(1),
        "submit",
        "feedback",
        vec![SubmittedField {
            custom_id: "name".to_owned(),
            value: Some("Ferris".to_owned()),
        }],
    );
    let submitted = client.dispatch(submission).await.unwrap();
    let ProcessResult::Responded(response) = submitted else {
        panic!("expected a response, got {submitted:?}");
    };
    assert_eq!(
        response.data.and_then(|data| data.content).as_deref(),
        Some("Thanks Ferris")
    );
}
