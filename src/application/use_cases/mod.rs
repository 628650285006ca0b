pub mod trace_dependencies;

pub use trace_dependencies::TraceDependenciesUseCase;
