use crate::{
    error::{ConsumerError, Result},
    models::Message,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// Future returned by [`ZeroQueueConsumer::receive_async`](crate::ZeroQueueConsumer::receive_async).
///
/// Resolves to [`ConsumerError::Interrupted`] if the consumer drops the
/// pending receive without completing it.
#[derive(Debug)]
pub struct ReceiveFuture {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Ready(Option<Result<Message>>),
    Pending(oneshot::Receiver<Result<Message>>),
}

impl ReceiveFuture {
    pub(crate) fn ready(result: Result<Message>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn pending(rx: oneshot::Receiver<Result<Message>>) -> Self {
        Self {
            inner: Inner::Pending(rx),
        }
    }
}

impl Future for ReceiveFuture {
    type Output = Result<Message>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(ConsumerError::InternalError(
                        "ReceiveFuture polled after completion".into(),
                    ))),
            ),
            Inner::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(ConsumerError::Interrupted))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection::ConnectionId, models::MessageId};

    #[tokio::test]
    async fn test_dropped_sender_interrupts() {
        let (tx, rx) = oneshot::channel::<Result<Message>>();
        drop(tx);
        let err = ReceiveFuture::pending(rx).await.unwrap_err();
        assert!(matches!(err, ConsumerError::Interrupted));
    }

    #[tokio::test]
    async fn test_ready_and_pending_resolve() {
        let cnx = ConnectionId::next();
        let msg = Message::new(MessageId::new(2, 3), &b"x"[..], cnx);
        let ready = ReceiveFuture::ready(Ok(msg.clone())).await.unwrap();
        assert_eq!(ready.id(), MessageId::new(2, 3));

        let (tx, rx) = oneshot::channel();
        tx.send(Ok(msg)).unwrap();
        let pending = ReceiveFuture::pending(rx).await.unwrap();
        assert_eq!(pending.connection(), cnx);
    }
}
