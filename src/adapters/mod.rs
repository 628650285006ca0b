/// Adapters - Infrastructure implementations of the ports
pub mod outbound;
