//! # Subscription Registry
//!
//! Thread-safe set of the symbols currently subscribed to. Mutated by
//! caller threads through subscribe/unsubscribe and read by the supervisor
//! task before forwarding each decoded event. One mutex guards the whole
//! check-then-act sequence: [`SubscriptionRegistry::with_symbols`] runs the
//! membership test and the downstream push under the same guard, so an
//! event can neither reach a subscriber that just unsubscribed nor miss one
//! that just subscribed mid-check.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    symbols: Mutex<HashSet<String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the symbol. Returns true when it was newly added; adding an
    /// already-present symbol is a no-op signal, not an error.
    pub fn subscribe(&self, symbol: &str) -> bool {
        let mut symbols = self.symbols.lock().expect("Registry lock poisoned");
        symbols.insert(symbol.to_string())
    }

    /// Removes the symbol. Returns true when it was present; removing an
    /// absent symbol is a no-op.
    pub fn unsubscribe(&self, symbol: &str) -> bool {
        let mut symbols = self.symbols.lock().expect("Registry lock poisoned");
        symbols.remove(symbol)
    }

    /// Membership test used by the supervisor before forwarding.
    pub fn is_subscribed(&self, symbol: &str) -> bool {
        let symbols = self.symbols.lock().expect("Registry lock poisoned");
        symbols.contains(symbol)
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.symbols.lock().expect("Registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` with the symbol set while holding the registry guard.
    ///
    /// The supervisor performs its subscription check and the aggregator
    /// push inside `f`, making check-then-forward atomic relative to
    /// concurrent subscribe/unsubscribe calls.
    pub fn with_symbols<R>(&self, f: impl FnOnce(&HashSet<String>) -> R) -> R {
        let symbols = self.symbols.lock().expect("Registry lock poisoned");
        f(&symbols)
    }
}
