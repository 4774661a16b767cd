pub use crate::assert_matches;
pub use crate::assertable::AssertableScenario;
pub use crate::error::TestResult;
pub use crate::init_test_logging;
pub use crate::{memory_service, LocalServiceHarness, SeededContentGenerator};
