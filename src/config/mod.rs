//! Configuration module

mod site;

pub use site::ConfigError;
pub use site::DuplicatesConfig;
pub use site::HighlightConfig;
pub use site::PublishConfig;
pub use site::SiteConfig;
pub use site::SortOrder;
