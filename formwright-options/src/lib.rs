//! # formwright-options
//!
//! Runtime option lists for the choice fields of a compiled form.
//!
//! After compiling a form, attach an [`OptionResolver`] to it. Every select
//! or radio field gets an [`OptionProvider`] that renderers subscribe to.
//! The host calls [`OptionResolver::refresh`] when a field becomes active
//! or the values it depends on change.
//!
//! ## Example
//!
//! ```rust,ignore
//! use formwright_options::{FnOptionFetcher, OptionResolver};
//!
//! let fetcher = FnOptionFetcher::new(|endpoint| async move {
//!     http_get_json(&endpoint).await
//! });
//! let resolver = OptionResolver::with_fetcher(Arc::new(fetcher));
//! resolver.attach(&form);
//!
//! let mut cities = resolver.subscribe("address.city")?;
//! resolver.refresh("address.city", &values).await?;
//! let options = cities.next().await;
//! ```

pub mod error;
pub mod fetcher;
pub mod path;
pub mod provider;
pub mod resolver;
pub mod template;

pub use error::{OptionError, OptionResult};
pub use fetcher::{FetchError, FnOptionFetcher, OptionCache, OptionFetcher, map_item, map_items};
pub use path::{Anchor, OptionsPath};
pub use provider::{OptionList, OptionProvider, OptionSubscription};
pub use resolver::OptionResolver;
