//! Per-field option streams.

use std::sync::Arc;

use formwright_compiler::{OptionSource, SelectOption};
use futures::Stream;
use smol_str::SmolStr;
use tokio::sync::watch;

/// Shared option list.
pub type OptionList = Arc<Vec<SelectOption>>;

/// Subscribable option source for one choice field.
///
/// Holds the current list and notifies subscribers when it changes.
/// Static sources start with their options; dynamic ones start empty.
#[derive(Debug)]
pub struct OptionProvider {
    path: SmolStr,
    source: OptionSource,
    sender: watch::Sender<OptionList>,
}

impl OptionProvider {
    /// Create a provider for the field at `path`.
    pub fn new(path: impl Into<SmolStr>, source: OptionSource) -> Self {
        let initial = source
            .static_options()
            .map(|options| Arc::new(options.to_vec()))
            .unwrap_or_default();
        let (sender, _) = watch::channel(initial);
        Self {
            path: path.into(),
            source,
            sender,
        }
    }

    /// Value path of the field; array items carry their index.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Where the options come from.
    pub fn source(&self) -> &OptionSource {
        &self.source
    }

    /// Whether refreshing can change the options.
    pub fn is_dynamic(&self) -> bool {
        self.source.is_dynamic()
    }

    /// The current options.
    pub fn current(&self) -> OptionList {
        self.sender.borrow().clone()
    }

    /// Replace the options, notifying subscribers if they changed.
    pub fn emit(&self, options: OptionList) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if **current == *options {
                false
            } else {
                *current = options;
                true
            }
        });
        if changed {
            tracing::trace!(path = %self.path, "Options changed");
        }
        changed
    }

    /// Subscribe; the first `next` yields the current options immediately.
    pub fn subscribe(&self) -> OptionSubscription {
        OptionSubscription {
            receiver: self.sender.subscribe(),
            primed: false,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of an [`OptionProvider`].
#[derive(Debug)]
pub struct OptionSubscription {
    receiver: watch::Receiver<OptionList>,
    primed: bool,
}

impl OptionSubscription {
    /// Next option list. Returns the current list on the first call, then
    /// waits for changes. `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<OptionList> {
        if self.primed {
            self.receiver.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Latest list without waiting.
    pub fn current(&self) -> OptionList {
        self.receiver.borrow().clone()
    }

    /// Turn the subscription into a stream of option lists.
    pub fn into_stream(self) -> impl Stream<Item = OptionList> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription.next().await.map(|options| (options, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    fn letters(values: &[&str]) -> OptionList {
        Arc::new(values.iter().map(|v| SelectOption::new(*v, *v)).collect())
    }

    #[tokio::test]
    async fn test_static_emits_on_subscribe() {
        let provider = OptionProvider::new(
            "status",
            OptionSource::Static(vec![SelectOption::new("a", "status.a")]),
        );
        let mut subscription = provider.subscribe();
        let first = subscription.next().await.unwrap();
        assert_eq!(first[0].label, "status.a");
        assert!(!provider.is_dynamic());
    }

    #[tokio::test]
    async fn test_emit_only_on_change() {
        let provider = OptionProvider::new("city", OptionSource::Endpoint("/cities".into()));
        assert!(provider.current().is_empty());

        let mut subscription = provider.subscribe();
        assert!(subscription.next().await.unwrap().is_empty());

        assert!(provider.emit(letters(&["a"])));
        assert!(!provider.emit(letters(&["a"])));
        assert_eq!(subscription.next().await.unwrap(), letters(&["a"]));

        provider.emit(letters(&["b"]));
        assert_eq!(subscription.current(), letters(&["b"]));
    }

    #[tokio::test]
    async fn test_stream_ends_with_provider() {
        let provider = OptionProvider::new("city", OptionSource::Path("country.cities".into()));
        let stream = provider.subscribe().into_stream();
        provider.emit(letters(&["x"]));
        drop(provider);

        let lists: Vec<OptionList> = stream.collect().await;
        assert_eq!(lists, vec![letters(&["x"])]);
    }
}
