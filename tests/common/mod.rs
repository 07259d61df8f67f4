#[allow(dead_code)]
pub mod harness;
#[allow(dead_code)]
pub mod mock_client;

pub use harness::TestHarness;
pub use mock_client::{entity, MockUpstreamClient};
