use tracing::warn;

use crate::item::ResultItem;
use crate::provider::{Control, Provider};

/// Run a query through the ordered provider chain, concatenating every
/// provider's items until one of them stops the chain.
///
/// A provider fault is isolated: it is logged against that provider alone
/// and the rest of the chain still runs. For a fixed query and fixed
/// provider state the output order is stable: provider order first, then
/// within-provider emission order.
pub fn evaluate(providers: &[Box<dyn Provider>], query: &str) -> Vec<ResultItem> {
    evaluate_with(providers, query, || false).unwrap_or_default()
}

/// Like [`evaluate`], but checks `canceled` before the first provider and
/// between providers, returning `None` as soon as it reports true. The
/// provider currently running is never interrupted; cancellation is a veto
/// on delivery, not preemption.
pub fn evaluate_with<F>(
    providers: &[Box<dyn Provider>],
    query: &str,
    mut canceled: F,
) -> Option<Vec<ResultItem>>
where
    F: FnMut() -> bool,
{
    let query = query.trim();
    let mut items = Vec::new();

    for provider in providers {
        if canceled() {
            return None;
        }
        match provider.provide(query) {
            Ok(provision) => {
                items.extend(provision.items);
                if provision.control == Control::Stop {
                    break;
                }
            }
            Err(err) => {
                warn!("provider '{}' failed: {err:#}", provider.name());
            }
        }
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, bail};

    use super::*;
    use crate::provider::Provision;

    struct Fixed {
        name: &'static str,
        labels: Vec<&'static str>,
        control: Control,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, labels: Vec<&'static str>, control: Control) -> Self {
            Self {
                name,
                labels,
                control,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn call_count(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl Provider for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn provide(&self, _query: &str) -> Result<Provision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let items = self.labels.iter().copied().map(ResultItem::text).collect();
            Ok(Provision {
                items,
                control: self.control,
            })
        }
    }

    struct Faulty;

    impl Provider for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn provide(&self, _query: &str) -> Result<Provision> {
            bail!("backing command not found");
        }
    }

    struct Trimming;

    impl Provider for Trimming {
        fn name(&self) -> &'static str {
            "trimming"
        }

        fn provide(&self, query: &str) -> Result<Provision> {
            Ok(Provision::stop(vec![ResultItem::text(query)]))
        }
    }

    fn labels(items: &[ResultItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn stop_short_circuits_the_chain() {
        let second = Fixed::new("b", vec!["y"], Control::Continue);
        let second_calls = second.call_count();
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(Fixed::new("a", vec!["x"], Control::Stop)),
            Box::new(second),
        ];

        let items = evaluate(&providers, "anything");
        assert_eq!(labels(&items), ["x"]);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn continue_concatenates_in_provider_order() {
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(Fixed::new("a", vec!["x"], Control::Continue)),
            Box::new(Fixed::new("b", vec!["y", "z"], Control::Continue)),
        ];

        let items = evaluate(&providers, "anything");
        assert_eq!(labels(&items), ["x", "y", "z"]);
    }

    #[test]
    fn a_faulty_provider_does_not_abort_the_chain() {
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(Fixed::new("a", vec!["x"], Control::Continue)),
            Box::new(Faulty),
            Box::new(Fixed::new("b", vec!["y"], Control::Continue)),
        ];

        let items = evaluate(&providers, "anything");
        assert_eq!(labels(&items), ["x", "y"]);
    }

    #[test]
    fn query_is_trimmed_before_providers_see_it() {
        let providers: Vec<Box<dyn Provider>> = vec![Box::new(Trimming)];
        let items = evaluate(&providers, "  spaced  ");
        assert_eq!(labels(&items), ["spaced"]);
    }

    #[test]
    fn cancellation_between_providers_discards_the_run() {
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(Fixed::new("a", vec!["x"], Control::Continue)),
            Box::new(Fixed::new("b", vec!["y"], Control::Continue)),
        ];

        let mut checks = 0;
        let outcome = evaluate_with(&providers, "anything", || {
            checks += 1;
            checks > 1
        });
        assert_eq!(outcome, None);
    }
}
