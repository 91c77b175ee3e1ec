//! Business logic services.
//!
//! The refresh pipeline, bottom to top: `gateway` (read interface) and its
//! HTTP implementation `gitlab_client`, `enricher` (one MR),
//! `repository_fetcher` (one project), `aggregator` (every project),
//! `differ` (two snapshots) and `poller` (the loop). `credentials` and
//! `notifier` sit beside it.
//!
//! Everything above `gateway` is independent of HTTP and tested against an
//! in-memory gateway.

pub mod aggregator;
pub mod credentials;
pub mod differ;
pub mod enricher;
pub mod gateway;
pub mod gitlab_client;
pub mod notifier;
pub mod poller;
pub mod repository_fetcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{aggregate, Aggregate, AggregateOptions, FailurePolicy, SortOrder};
pub use credentials::CredentialService;
pub use differ::diff;
pub use gateway::{MergeRequestGateway, MergeRequestsQuery};
pub use gitlab_client::{GitLabClient, GitLabClientConfig};
pub use notifier::{dispatch, LogNotifier, Notification, NotificationSink};
pub use poller::{Poller, PollerConfig, PollerPhase, PollerStatus};
