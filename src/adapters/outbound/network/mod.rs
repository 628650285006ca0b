pub mod artifactory_client;

pub use artifactory_client::AqlArtifactRepository;
