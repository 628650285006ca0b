/// Ports - interface definitions for infrastructure
///
/// Only outbound (driven) ports exist: the engine is driven directly by
/// the CLI, but every external system it touches (artifact repository,
/// persisted cache, package-manager processes, console) sits behind a
/// trait so tests can substitute in-memory implementations.
pub mod outbound;
