use std::sync::{Arc, Mutex};

use tracing::{subscriber::DefaultGuard, Event, Level, Subscriber};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    Layer,
};

/// Levels of every event seen while the guard is held.
#[derive(Clone, Default)]
pub(crate) struct RecordedLevels(Arc<Mutex<Vec<Level>>>);

impl RecordedLevels {
    /// Install a recorder as this thread's default subscriber.
    pub(crate) fn install() -> (Self, DefaultGuard) {
        let levels = Self::default();
        let subscriber = tracing_subscriber::registry().with(levels.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (levels, guard)
    }

    pub(crate) fn contains(&self, level: Level) -> bool {
        self.0.lock().unwrap().contains(&level)
    }
}

impl<S: Subscriber> Layer<S> for RecordedLevels {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(*event.metadata().level());
    }
}
