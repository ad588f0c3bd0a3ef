mod common;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use common::{button, click, client, text, MockResponder, Sent};
use tether::{
    prelude::*,
    twilight_exports::{Id, InteractionResponseType},
};

fn counting_view(counter: &Arc<AtomicUsize>, ids: &[&str]) -> View {
    let view = View::builder().timeout(None).build();
    for id in ids {
        let counter = Arc::clone(counter);
        view.add_item(button(id), move |ctx: ViewContext, _| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.respond(text("counted")).await?;
                Ok(())
            }
        })
        .unwrap();
    }
    view
}

#[tokio::test]
async fn persistent_views_survive_restarts() {
    let responder = MockResponder::default();
    let counter = Arc::new(AtomicUsize::new(0));

    let before = client(&responder);
    let view = counting_view(&counter, &["vote:yes", "vote:no"]);
    assert!(view.is_persistent());
    before.start_view(&view, Bind::Unbound).unwrap();
    before.close();
    assert!(view.is_stopped());

    // A fresh process knows nothing about the message the view was sent with.
    let after = client(&responder);
    let view = counting_view(&counter, &["vote:yes", "vote:no"]);
    after.start_view(&view, Bind::Unbound).unwrap();

    let result = after.dispatch(click(10, "vote:no", 777)).await.unwrap();
    assert_eq!(result, ProcessResult::Dispatched);

    let sent = responder.wait_for(1).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(matches!(&sent[..], [Sent::Response(token, _)] if token == "token-10"));
    assert!(view.is_listening());
}

#[tokio::test]
async fn transient_views_cannot_listen_unbound() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let view = View::new();
    view.add_bare_item(Button::builder().label("random").build().unwrap())
        .unwrap();

    assert!(!view.is_persistent());
    assert_eq!(
        client.start_view(&view, Bind::Unbound),
        Err(LifecycleError::NotPersistent)
    );
    assert_eq!(view.state(), HandlerState::Created);
}

#[tokio::test]
async fn later_views_take_over_shared_custom_ids() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let first_count = Arc::new(AtomicUsize::new(0));
    let second_count = Arc::new(AtomicUsize::new(0));

    let first = counting_view(&first_count, &["shared"]);
    let second = counting_view(&second_count, &["shared"]);
    client.start_view(&first, Bind::Unbound).unwrap();
    client.start_view(&second, Bind::Unbound).unwrap();

    assert!(first.wait_timeout(Duration::from_secs(1)).await);
    assert!(second.is_listening());

    client.dispatch(click(20, "shared", 1)).await.unwrap();
    responder.wait_for(1).await;

    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn partially_displaced_views_keep_listening() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let counter = Arc::new(AtomicUsize::new(0));

    let first = counting_view(&counter, &["a", "b"]);
    let second = counting_view(&counter, &["b"]);
    client.start_view(&first, Bind::Unbound).unwrap();
    client.start_view(&second, Bind::Unbound).unwrap();

    assert!(first.is_listening());
    assert!(second.is_listening());
}

#[tokio::test]
async fn message_bound_views_are_replaced() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let counter = Arc::new(AtomicUsize::new(0));

    let first = counting_view(&counter, &["a"]);
    let second = counting_view(&counter, &["a"]);
    client.start_view(&first, Bind::Message(Id::new(42))).unwrap();
    client.start_view(&second, Bind::Message(Id::new(42))).unwrap();

    assert!(first.is_stopped());
    assert_eq!(
        client.get_view(Id::new(42)).map(|view| view.id()),
        Some(second.id())
    );

    client.remove_message(Id::new(42));
    assert!(second.is_stopped());
    assert!(client.get_view(Id::new(42)).is_none());
}

#[tokio::test]
async fn bound_views_ignore_other_messages() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let counter = Arc::new(AtomicUsize::new(0));

    let view = counting_view(&counter, &["a"]);
    client.start_view(&view, Bind::Message(Id::new(42))).unwrap();

    let result = client.dispatch(click(1, "a", 43)).await.unwrap();
    assert_eq!(result, ProcessResult::Unhandled);
}

#[tokio::test]
async fn pending_views_bind_to_their_first_message() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let counter = Arc::new(AtomicUsize::new(0));

    let view = View::new();
    let count = Arc::clone(&counter);
    view.add_item(Button::builder().label("go").build().unwrap(), move |_, _| {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();
    let custom_id = view.items()[0].custom_id().unwrap().to_owned();

    client.start_view(&view, Bind::Auto).unwrap();
    assert!(view.message_id().is_none());

    client.dispatch(click(1, &custom_id, 99)).await.unwrap();
    assert_eq!(view.message_id(), Some(Id::new(99)));
    assert_eq!(
        client.dispatch(click(2, &custom_id, 100)).await.unwrap(),
        ProcessResult::Unhandled
    );
}

#[tokio::test]
async fn rejected_checks_skip_callbacks() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let counter = Arc::new(AtomicUsize::new(0));

    let view = View::builder()
        .timeout(None)
        .check(|ctx: ViewContext| async move { ctx.user_id() == Some(Id::new(7)) })
        .build();
    let count = Arc::clone(&counter);
    view.add_item(button("guarded"), move |_, _| {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    client
        .dispatch(click(1, "guarded", 5).with_user(Id::new(8)))
        .await
        .unwrap();
    client
        .dispatch(click(2, "guarded", 5).with_user(Id::new(7)))
        .await
        .unwrap();

    for _ in 0..50 {
        if counter.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_interactions_are_deferred() {
    let responder = MockResponder::default();
    let client = client(&responder);

    let view = View::builder().timeout(None).build();
    view.add_item(button("slow"), |ctx: ViewContext, _| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        ctx.respond(text("done")).await?;
        Ok(())
    })
    .unwrap();
    client.start_view(&view, Bind::Unbound).unwrap();

    client.dispatch(click(1, "slow", 3)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert!(responder.sent().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(matches!(
        &responder.sent()[..],
        [Sent::Response(_, response)] if response.kind == InteractionResponseType::DeferredUpdateMessage
    ));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(matches!(&responder.sent()[..], [_, Sent::Followup(_, _)]));
}

#[tokio::test(start_paused = true)]
async fn views_time_out_without_interactions() {
    let responder = MockResponder::default();
    let client = client(&responder);
    let timeouts = Arc::new(AtomicUsize::new(0));

    let count = Arc::clone(&timeouts);
    let view = View::builder()
        .timeout(Duration::from_secs(10))
        .autodefer(false)
        .on_timeout(move |_| {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();
    view.add_item(button("tick"), |_, _| async { Ok(()) }).unwrap();
    client.start_view(&view, Bind::Message(Id::new(2))).unwrap();

    // Every interaction restarts the countdown.
    tokio::time::sleep(Duration::from_secs(8)).await;
    client.dispatch(click(1, "tick", 2)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(8)).await;
    assert!(view.is_listening());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(view.is_stopped());
    assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.dispatch(click(2, "tick", 2)).await.unwrap(),
        ProcessResult::Unhandled
    );
}
