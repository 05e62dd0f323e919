pub mod comparator;
pub mod fetchers;
pub mod pod_resolver;
pub mod update_checker;

pub use fetchers::{default_fetchers, TagFetcher};
pub use pod_resolver::{KubePodLister, PodLister, PodVersionResolver};
pub use update_checker::{CheckSummary, UpdateChecker, UpdateError};
