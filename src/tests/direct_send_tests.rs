//! tests/direct_send_tests.rs

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use crate::models::message_model::MessageStatus;
    use crate::services::direct_send::DirectSendService;
    use crate::tests::support::{anchor, campaign_with_messages, Harness};

    fn service(h: &Harness) -> DirectSendService {
        DirectSendService::new(
            h.store.clone(),
            h.simulator.clone(),
            &h.config,
            h.shutdown.listener(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_marks_sent_and_finishes_in_background() {
        let h = Harness::new(&[]);
        h.store.insert(campaign_with_messages("c1", None, 1));
        let direct = service(&h);

        let returned = direct.send_message("c1-m1").await.unwrap().unwrap();
        assert_eq!(returned.status, MessageStatus::Sent);
        assert_eq!(h.store.message("c1", "c1-m1").status, MessageStatus::Sent);

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let stored = h.store.message("c1", "c1-m1");
        assert_eq!(stored.status, MessageStatus::Read);
        assert_eq!(stored.sent_at, Some(anchor()));
        assert_eq!(
            stored.delivered_at,
            Some(anchor() + ChronoDuration::milliseconds(1000))
        );
        assert_eq!(stored.read_at, Some(anchor() + ChronoDuration::milliseconds(3000)));
        assert!(stored.replied_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_pending_message_is_returned_untouched() {
        let h = Harness::new(&[]);
        let mut campaign = campaign_with_messages("c1", None, 1);
        campaign.messages[0]
            .advance(MessageStatus::Sent, anchor())
            .unwrap();
        h.store.insert(campaign);
        let direct = service(&h);

        let returned = direct.send_message("c1-m1").await.unwrap().unwrap();
        assert_eq!(returned.status, MessageStatus::Sent);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.store.message_saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_message_is_none() {
        let h = Harness::new(&[]);
        let direct = service(&h);

        assert!(direct.send_message("missing").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_background_progression() {
        let h = Harness::new(&[]);
        h.store.insert(campaign_with_messages("c1", None, 1));
        let direct = service(&h);

        direct.send_message("c1-m1").await.unwrap();
        h.shutdown.shutdown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(h.store.message("c1", "c1-m1").status, MessageStatus::Sent);
    }
}
