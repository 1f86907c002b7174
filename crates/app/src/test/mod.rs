//! Test support shared by the service and worker tests.

use catalogue_predicates::fixtures::{Fixture, FixtureError};


pub(crate) use context::TestContext;

/// The `apparel` fixture set shipped with the repository.
pub(crate) fn fixture() -> Result<Fixture, FixtureError> {
    Fixture::from_set_in(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"), "apparel")
}
