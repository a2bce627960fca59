//! Fire-and-forget delivery of notifications.

use tokio::task::JoinHandle;

use crate::notification::{WhatsAppClient, mask_number};

/// Send `text` to `to` on a detached task.
///
/// The caller does not wait for delivery. Success or failure is only logged.
/// Returns `None` without spawning anything when notifications are not
/// configured.
pub fn send_in_background(
    client: Option<WhatsAppClient>,
    to: String,
    text: String,
) -> Option<JoinHandle<()>> {
    let Some(client) = client else {
        tracing::warn!(
            "WhatsApp credentials are not configured, skipping message to {}",
            mask_number(&to)
        );
        return None;
    };

    Some(tokio::spawn(async move {
        match client.send_message(&to, &text).await {
            Ok(()) => tracing::info!("Delivered notification to {}", mask_number(&to)),
            Err(error) => tracing::error!(
                "Could not deliver notification to {}: {error}",
                mask_number(&to)
            ),
        }
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::notification::test_provider::{spawn_provider, unreachable_client};

    use super::send_in_background;

    #[tokio::test]
    async fn skips_when_not_configured() {
        let handle = send_in_background(None, "1".to_owned(), "hello".to_owned());

        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn delivers_on_a_detached_task() {
        let (client, received) = spawn_provider(StatusCode::OK).await;

        let handle = send_in_background(Some(client), "1".to_owned(), "hello".to_owned())
            .expect("expected a task to be spawned");
        handle.await.expect("notification task panicked");

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_panic() {
        let client = unreachable_client().await;

        let handle = send_in_background(Some(client), "1".to_owned(), "hello".to_owned())
            .expect("expected a task to be spawned");

        assert!(handle.await.is_ok());
    }
}
