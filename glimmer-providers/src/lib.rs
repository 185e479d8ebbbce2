//! The built-in providers.
//!
//! A fixed, statically enumerated set; new providers are added by extending
//! this crate, not by loading code at runtime.

pub mod apps;
pub mod calc;
pub mod dict;
pub mod places;
pub mod reset;
pub mod shell;
pub mod windows;

use glimmer_core::{CacheStore, Config, Provider};

pub use apps::ApplicationProvider;
pub use calc::CalculatorProvider;
pub use dict::DictionaryProvider;
pub use places::DirectoryProvider;
pub use reset::ResetCacheProvider;
pub use shell::CommandLineProvider;
pub use windows::OpenWindowProvider;

/// The provider chain in its configured order. Order matters: earlier
/// providers may stop the chain, and items are displayed in chain order.
pub fn default_chain(config: &Config, cache: &CacheStore) -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(ResetCacheProvider),
        Box::new(DictionaryProvider),
        Box::new(CalculatorProvider::new()),
        Box::new(DirectoryProvider::new(config, cache)),
        Box::new(OpenWindowProvider::new()),
        Box::new(CommandLineProvider),
        Box::new(ApplicationProvider::new(config, cache)),
    ]
}
