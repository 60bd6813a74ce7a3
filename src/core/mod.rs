pub mod builder;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod golden;
pub mod model;

pub use builder::{build_test_request, DefinitionResolver, MockRequestBuilder};
pub use config::{ConfigLoader, Credentials, HarnessConfig, Target};
pub use error::{HarnessError, HarnessResult};
pub use fixtures::FixtureStore;
pub use model::*;
