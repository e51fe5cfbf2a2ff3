// Change listener for the live order pipeline.
//
// Purpose
// - Turn realtime notifications into refresh requests.
//
// Responsibilities
// - Subscribe to tab items (any event), counter order items (any event) and counter orders (updates only).
// - Ignore payloads. A notification only means "run again".
// - Tear the subscriptions down on `stop` or when the guard is dropped.

use crate::modules::live_orders::use_cases::refresh_live_orders::handler::RefreshTrigger;
use crate::modules::live_orders::use_cases::refresh_live_orders::scheduler::RefreshScheduler;
use crate::shared::infrastructure::change_feed::{
    ChangeFeed, ChangeFeedError, ChangeKind, ChangeNotification, Collection,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Whether a notification should cause a refresh.
pub fn is_relevant(notification: &ChangeNotification) -> bool {
    match notification.collection {
        Collection::TabItems | Collection::CounterOrderItems => true,
        Collection::CounterOrders => notification.kind == ChangeKind::Update,
    }
}

pub struct ChangeListener;

impl ChangeListener {
    pub fn start(
        feed: &dyn ChangeFeed,
        scheduler: Arc<RefreshScheduler>,
    ) -> Result<ChangeSubscription, ChangeFeedError> {
        let tab_items = feed.subscribe(Collection::TabItems)?;
        let counter_items = feed.subscribe(Collection::CounterOrderItems)?;
        let counter_orders = feed.subscribe(Collection::CounterOrders)?;

        let token = CancellationToken::new();
        let task = tokio::spawn(forward(
            [tab_items, counter_items, counter_orders],
            scheduler,
            token.clone(),
        ));
        tracing::info!("subscribed to live order change notifications");
        Ok(ChangeSubscription {
            token,
            task: Some(task),
        })
    }
}

const WATCHED: [Collection; 3] = [
    Collection::TabItems,
    Collection::CounterOrderItems,
    Collection::CounterOrders,
];

async fn forward(
    receivers: [broadcast::Receiver<ChangeNotification>; 3],
    scheduler: Arc<RefreshScheduler>,
    token: CancellationToken,
) {
    let mut receivers = receivers.map(Some);
    // A closed channel stops being polled. The others keep forwarding.
    while receivers.iter().any(Option::is_some) {
        let [tab_items, counter_items, counter_orders] = &mut receivers;
        let (index, received) = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = next_change(tab_items) => (0, received),
            received = next_change(counter_items) => (1, received),
            received = next_change(counter_orders) => (2, received),
        };
        let collection = WATCHED[index];
        match received {
            Ok(notification) if is_relevant(&notification) => {
                scheduler.request(RefreshTrigger::Change(notification.collection));
            }
            Ok(notification) => {
                tracing::trace!(?notification, "ignoring change notification");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(collection = collection.as_str(), skipped, "change notifications lagged");
                scheduler.request(RefreshTrigger::Lagged(collection));
            }
            Err(RecvError::Closed) => {
                tracing::warn!(collection = collection.as_str(), "change feed closed");
                receivers[index] = None;
            }
        }
    }
    tracing::info!("unsubscribed from live order change notifications");
}

async fn next_change(
    receiver: &mut Option<broadcast::Receiver<ChangeNotification>>,
) -> Result<ChangeNotification, RecvError> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Live subscription to the change feed. Dropping it cancels the forwarding task.
pub struct ChangeSubscription {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    pub fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            tracing::error!(%error, "change listener task failed");
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod change_listener_tests {
    use super::*;
    use crate::shared::infrastructure::change_feed::in_memory::InMemoryChangeFeed;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Feed whose channels can be closed one at a time.
    struct ClosableFeed {
        senders: Mutex<HashMap<Collection, broadcast::Sender<ChangeNotification>>>,
    }

    impl ClosableFeed {
        fn new() -> Self {
            let senders = WATCHED
                .into_iter()
                .map(|collection| (collection, broadcast::channel(4).0))
                .collect();
            Self {
                senders: Mutex::new(senders),
            }
        }

        fn close(&self, collection: Collection) {
            self.senders.lock().unwrap().remove(&collection);
        }

        fn publish(&self, collection: Collection, kind: ChangeKind) {
            if let Some(sender) = self.senders.lock().unwrap().get(&collection) {
                let _ = sender.send(ChangeNotification { collection, kind });
            }
        }
    }

    impl ChangeFeed for ClosableFeed {
        fn subscribe(
            &self,
            collection: Collection,
        ) -> Result<broadcast::Receiver<ChangeNotification>, ChangeFeedError> {
            self.senders
                .lock()
                .unwrap()
                .get(&collection)
                .map(broadcast::Sender::subscribe)
                .ok_or_else(|| ChangeFeedError::Unavailable(collection.as_str().to_string()))
        }
    }

    #[fixture]
    fn before_each() -> (Arc<InMemoryChangeFeed>, Arc<RefreshScheduler>) {
        (Arc::new(InMemoryChangeFeed::new(4)), RefreshScheduler::new())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[rstest]
    #[case(Collection::TabItems, ChangeKind::Insert, true)]
    #[case(Collection::TabItems, ChangeKind::Delete, true)]
    #[case(Collection::CounterOrderItems, ChangeKind::Update, true)]
    #[case(Collection::CounterOrders, ChangeKind::Update, true)]
    #[case(Collection::CounterOrders, ChangeKind::Insert, false)]
    #[case(Collection::CounterOrders, ChangeKind::Delete, false)]
    fn it_should_filter_notifications(
        #[case] collection: Collection,
        #[case] kind: ChangeKind,
        #[case] expected: bool,
    ) {
        assert_eq!(is_relevant(&ChangeNotification { collection, kind }), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_request_a_refresh_for_relevant_notifications(
        before_each: (Arc<InMemoryChangeFeed>, Arc<RefreshScheduler>),
    ) {
        let (feed, scheduler) = before_each;
        let subscription = ChangeListener::start(feed.as_ref(), scheduler.clone()).unwrap();

        feed.publish(Collection::TabItems, ChangeKind::Insert);
        feed.publish(Collection::CounterOrders, ChangeKind::Insert);
        feed.publish(Collection::CounterOrders, ChangeKind::Update);
        settle().await;

        assert_eq!(scheduler.request(RefreshTrigger::Manual), 3);
        subscription.stop().await;
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_unsubscribe_on_stop(
        before_each: (Arc<InMemoryChangeFeed>, Arc<RefreshScheduler>),
    ) {
        let (feed, scheduler) = before_each;
        let subscription = ChangeListener::start(feed.as_ref(), scheduler).unwrap();
        assert!(subscription.is_active());
        assert_eq!(feed.receiver_count(Collection::CounterOrders), 1);

        subscription.stop().await;

        assert_eq!(feed.receiver_count(Collection::TabItems), 0);
        assert_eq!(feed.receiver_count(Collection::CounterOrderItems), 0);
        assert_eq!(feed.receiver_count(Collection::CounterOrders), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_unsubscribe_when_dropped(
        before_each: (Arc<InMemoryChangeFeed>, Arc<RefreshScheduler>),
    ) {
        let (feed, scheduler) = before_each;
        drop(ChangeListener::start(feed.as_ref(), scheduler).unwrap());
        settle().await;
        assert_eq!(feed.receiver_count(Collection::TabItems), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_refresh_after_lagging(
        before_each: (Arc<InMemoryChangeFeed>, Arc<RefreshScheduler>),
    ) {
        let (feed, scheduler) = before_each;
        let subscription = ChangeListener::start(feed.as_ref(), scheduler.clone()).unwrap();
        // Capacity is 4, so a burst overflows the receiver before it is polled.
        for _ in 0..10 {
            feed.publish(Collection::CounterOrderItems, ChangeKind::Insert);
        }
        settle().await;
        // One request for the lag plus one per retained notification.
        assert_eq!(scheduler.request(RefreshTrigger::Manual), 6);
        subscription.stop().await;
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_forwarding_when_one_channel_closes() {
        let feed = ClosableFeed::new();
        let scheduler = RefreshScheduler::new();
        let subscription = ChangeListener::start(&feed, scheduler.clone()).unwrap();

        feed.close(Collection::CounterOrders);
        settle().await;
        assert!(subscription.is_active());

        feed.publish(Collection::TabItems, ChangeKind::Insert);
        settle().await;
        feed.publish(Collection::CounterOrderItems, ChangeKind::Update);
        settle().await;

        assert_eq!(scheduler.request(RefreshTrigger::Manual), 3);
        subscription.stop().await;
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stop_once_every_channel_has_closed() {
        let feed = ClosableFeed::new();
        let subscription = ChangeListener::start(&feed, RefreshScheduler::new()).unwrap();

        feed.close(Collection::TabItems);
        feed.close(Collection::CounterOrderItems);
        settle().await;
        assert!(subscription.is_active());

        feed.close(Collection::CounterOrders);
        settle().await;
        assert!(!subscription.is_active());
    }

    #[rstest]
    fn it_should_fail_to_start_when_the_feed_is_offline() {
        let mut feed = InMemoryChangeFeed::new(4);
        feed.toggle_offline();
        let result = ChangeListener::start(&feed, RefreshScheduler::new());
        assert!(result.is_err());
    }
}
