//! Integration tests against a live MongoDB.
//!
//! Set `TROVE_TEST_MONGODB_URI` to run them; each test works in its own
//! throwaway database and is skipped when the variable is unset.

mod helpers;
mod paging_test;
mod repository_test;
mod counter_test;
