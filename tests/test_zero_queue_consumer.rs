//! Integration tests for the zero-queue consumer.
//!
//! Drive the public API the way a transport would: install connections via
//! `on_reconnect`, feed inbound messages via `message_received`, and observe
//! the flow permits recorded on each connection.
//!
//! Run with: cargo test --test test_zero_queue_consumer -- --nocapture

mod common;

use common::{pull_consumer, wait_until, RecordingConnection};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use zeroq_link::{
    Admission, BatchedFrame, Connection, ConsumerConfig, ConsumerError, DisconnectReason,
    EventHandlers, MessageId, ZeroQueueConsumer,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_receive_while_disconnected_grants_credit_on_connect() {
    let consumer = pull_consumer();
    let receive = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.receive().await }
    });

    wait_until("receive to start waiting", || consumer.is_awaiting_message()).await;
    assert!(!consumer.is_connected());

    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();
    assert_eq!(cnx.flows(), vec![1], "exactly one credit at connect");

    consumer.message_received(cnx.message(1));
    let message = tokio::time::timeout(Duration::from_secs(5), receive)
        .await
        .expect("receive should complete")
        .unwrap()
        .unwrap();

    assert_eq!(message.id(), MessageId::new(10, 1));
    assert_eq!(message.payload().as_ref(), b"payload-1");
    assert_eq!(cnx.flows(), vec![1]);
    assert!(!consumer.is_awaiting_message());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnect_race_discards_old_connection_message() {
    let consumer = pull_consumer();
    let a = RecordingConnection::new();
    consumer.on_reconnect(a.clone(), 0).unwrap();

    let receive = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.receive().await }
    });
    a.wait_for_permits(1).await;

    a.drop_link();
    assert!(consumer.connection_closed(a.id(), DisconnectReason::new("reset by peer")));
    let b = RecordingConnection::new();
    consumer.on_reconnect(b.clone(), 0).unwrap();
    assert_eq!(b.flows(), vec![1], "credit re-issued on the new connection");

    // The broker had already dispatched on A before it died.
    consumer.message_received(a.message(1));
    wait_until("stale message to be discarded", || {
        consumer.stats().num_stale_discarded == 1
    })
    .await;
    assert!(!receive.is_finished());

    consumer.message_received(b.message(2));
    let message = tokio::time::timeout(Duration::from_secs(5), receive)
        .await
        .expect("receive should complete")
        .unwrap()
        .unwrap();

    assert_eq!(message.connection(), b.id());
    assert_eq!(message.id().entry_id, 2);
    assert_eq!(a.flows(), vec![1]);
    assert_eq!(b.flows(), vec![1], "stale message must not cost an extra credit");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_credit_per_message_across_reconnects() {
    let consumer = pull_consumer();
    let mut cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();
    // (connection, credits it should have been granted)
    let mut credits = vec![(cnx.clone(), 0u32)];

    for round in 0..6u64 {
        let receive = tokio::spawn({
            let consumer = consumer.clone();
            async move { consumer.receive().await }
        });
        let expected = {
            let entry = credits.last_mut().unwrap();
            entry.1 += 1;
            entry.1
        };
        cnx.wait_for_permits(expected).await;

        if round % 2 == 1 {
            // The credit granted on `old` dies with it and is reissued once.
            let old = cnx.clone();
            consumer.connection_closed(old.id(), DisconnectReason::new("flap"));
            cnx = RecordingConnection::new();
            consumer.on_reconnect(cnx.clone(), 0).unwrap();
            credits.push((cnx.clone(), 1));
            assert_eq!(cnx.flows(), vec![1]);
            consumer.message_received(old.message(100 + round));
        }

        consumer.message_received(cnx.message(round));
        let message = tokio::time::timeout(Duration::from_secs(5), receive)
            .await
            .expect("receive should complete")
            .unwrap()
            .unwrap();
        assert_eq!(message.connection(), cnx.id());
        assert_eq!(Some(message.connection()), consumer.cnx().map(|c| c.id()));
    }

    for (connection, expected) in &credits {
        assert_eq!(
            connection.permits(),
            *expected,
            "unexpected credits on {}",
            connection.id()
        );
    }
    let stats = consumer.stats();
    assert_eq!(stats.num_msgs_received, 6);
    assert_eq!(stats.num_flow_permits_sent, 9);
    assert_eq!(stats.num_stale_discarded, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listener_replenishes_after_each_call() {
    let cnx = RecordingConnection::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .listener({
            let cnx = cnx.clone();
            let calls = calls.clone();
            move |_, message| {
                calls.lock().unwrap().push((message.id().entry_id, cnx.permits()));
                Ok(())
            }
        })
        .build()
        .unwrap();

    consumer.on_reconnect(cnx.clone(), 0).unwrap();
    assert_eq!(cnx.flows(), vec![1], "idle listener gets its first credit");

    consumer.message_received(cnx.message(1));
    consumer.message_received(cnx.message(2));

    wait_until("both listener calls", || calls.lock().unwrap().len() == 2).await;
    cnx.wait_for_permits(3).await;

    assert_eq!(*calls.lock().unwrap(), vec![(1, 1), (2, 2)]);
    assert_eq!(cnx.flows(), vec![1, 1, 1]);
    assert_eq!(consumer.stats().num_msgs_received, 2);
    assert_eq!(consumer.buffered_messages(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listener_ignores_message_from_replaced_connection() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .listener({
            let delivered = delivered.clone();
            move |_, message| {
                delivered.lock().unwrap().push(message.connection());
                Ok(())
            }
        })
        .build()
        .unwrap();

    let a = RecordingConnection::new();
    consumer.on_reconnect(a.clone(), 0).unwrap();
    assert!(consumer.connection_closed(a.id(), DisconnectReason::new("reset by peer")));
    let b = RecordingConnection::new();
    consumer.on_reconnect(b.clone(), 0).unwrap();
    assert_eq!(b.flows(), vec![1], "idle listener gets one credit on B");

    // Dispatched by the broker on A before it died.
    assert_eq!(consumer.can_enqueue_message(&a.message(1)), Admission::Reject);
    consumer.message_received(a.message(2));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(delivered.lock().unwrap().is_empty());
    assert_eq!(b.flows(), vec![1], "stale message must not replenish on B");
    assert_eq!(consumer.stats().num_stale_discarded, 2);

    consumer.message_received(b.message(3));
    b.wait_for_permits(2).await;
    assert_eq!(*delivered.lock().unwrap(), vec![b.id()]);
    assert_eq!(b.flows(), vec![1, 1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listener_mode_never_buffers_and_rejects_receive() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .listener({
            let delivered = delivered.clone();
            move |_, message| {
                delivered.lock().unwrap().push(message.id());
                Ok(())
            }
        })
        .build()
        .unwrap();
    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    assert_eq!(consumer.can_enqueue_message(&cnx.message(1)), Admission::Reject);
    wait_until("listener call", || delivered.lock().unwrap().len() == 1).await;
    assert_eq!(consumer.buffered_messages(), 0);

    assert!(matches!(
        consumer.receive().await,
        Err(ConsumerError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        consumer.receive_async().await,
        Err(ConsumerError::InvalidConfiguration(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listener_error_still_replenishes() {
    let cnx = RecordingConnection::new();
    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .listener(|_, _| Err("handler failed".into()))
        .build()
        .unwrap();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    consumer.message_received(cnx.message(1));
    cnx.wait_for_permits(2).await;
    assert_eq!(consumer.stats().num_listener_failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnect_during_listener_call_defers_to_replenish() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let first = RecordingConnection::new();

    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .listener(move |_, _| {
            let _ = release_rx.lock().unwrap().recv();
            Ok(())
        })
        .build()
        .unwrap();
    consumer.on_reconnect(first.clone(), 0).unwrap();
    consumer.message_received(first.message(1));

    consumer.connection_closed(first.id(), DisconnectReason::new("flap"));
    let second = RecordingConnection::new();
    consumer.on_reconnect(second.clone(), 0).unwrap();
    assert!(
        second.flows().is_empty(),
        "no credit while the listener still holds a message"
    );

    release_tx.send(()).unwrap();
    second.wait_for_permits(1).await;
    assert_eq!(second.flows(), vec![1]);
    assert_eq!(first.flows(), vec![1]);
}

#[tokio::test]
async fn test_batch_fails_pending_receive_and_closes() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let consumer = ZeroQueueConsumer::builder(
        ConsumerConfig::new("orders", "billing").with_consumer_name("billing-1"),
    )
    .event_handlers(EventHandlers::new().on_error({
        let errors = errors.clone();
        move |e| errors.lock().unwrap().push(e)
    }))
    .build()
    .unwrap();
    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    let pending = consumer.receive_async();
    consumer.batch_received(BatchedFrame::new(MessageId::new(10, 1), 2, cnx.id()));

    let err = pending.await.unwrap_err();
    assert!(err.is_batching_not_supported());
    assert!(err
        .to_string()
        .contains("Unsupported batch message with zero receiver queue size for [billing]-[billing-1]"));

    wait_until("consumer to close", || consumer.is_closed()).await;
    assert!(cnx.consumer_closed());
    assert!(consumer.receive().await.unwrap_err().is_batching_not_supported());
    assert!(!errors.lock().unwrap()[0].recoverable);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_batch_fails_blocking_receive() {
    let consumer = pull_consumer();
    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    let receive = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.receive().await }
    });
    cnx.wait_for_permits(1).await;

    consumer.batch_received(BatchedFrame::new(MessageId::new(10, 1), 5, cnx.id()));
    let result = tokio::time::timeout(Duration::from_secs(5), receive)
        .await
        .expect("blocked receive should wake")
        .unwrap();
    assert!(result.unwrap_err().is_batching_not_supported());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_unblocks_receive_and_fails_pending() {
    let closed = Arc::new(Mutex::new(0));
    let consumer = ZeroQueueConsumer::builder(ConsumerConfig::new("orders", "billing"))
        .event_handlers(EventHandlers::new().on_close({
            let closed = closed.clone();
            move || *closed.lock().unwrap() += 1
        }))
        .build()
        .unwrap();

    let receive = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.receive().await }
    });
    wait_until("receive to start waiting", || consumer.is_awaiting_message()).await;

    consumer.close().await.unwrap();
    consumer.close().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), receive)
        .await
        .expect("receive should wake on close")
        .unwrap();
    assert!(matches!(result, Err(ConsumerError::ClientClosed)));
    assert!(matches!(
        consumer.receive_async().await,
        Err(ConsumerError::ClientClosed)
    ));
    assert_eq!(*closed.lock().unwrap(), 1);

    let late = RecordingConnection::new();
    assert!(matches!(
        consumer.on_reconnect(late.clone(), 0),
        Err(ConsumerError::ClientClosed)
    ));
    assert!(late.flows().is_empty());
}

#[tokio::test]
async fn test_cancelled_receive_clears_waiting_state() {
    let consumer = pull_consumer();
    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), consumer.receive()).await;
    assert!(timed_out.is_err());
    assert!(!consumer.is_awaiting_message());
    assert_eq!(consumer.stats().num_receive_failed, 1);
}

#[tokio::test]
async fn test_acknowledge_goes_to_current_connection() {
    let consumer = pull_consumer();
    let cnx = RecordingConnection::new();
    consumer.on_reconnect(cnx.clone(), 0).unwrap();

    let pending = consumer.receive_async();
    consumer.message_received(cnx.message(3));
    let message = pending.await.unwrap();

    consumer.acknowledge(&message.id()).unwrap();
    assert_eq!(cnx.acks(), vec![MessageId::new(10, 3)]);
    assert_eq!(consumer.last_dequeued_message(), Some(message.id()));
}
