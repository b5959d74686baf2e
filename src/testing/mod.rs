//! Test-only support: shared fixtures, mock capabilities, and a small
//! benchmarking helper. Mirrors the teacher's `testing` module
//! structure (`TestFixtures`, `mock_services`, `benchmarks`) adapted to
//! this engine's capabilities.

pub mod benchmarks;
pub mod fixtures;
pub mod mocks;
