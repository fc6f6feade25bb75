use goalreach_core::ConfigError;

/// Errors surfaced to the caller of the goal region.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("there are no goals to sample")]
    EmptyRegion,

    #[error("goal index {index} out of range for {len} goals")]
    OutOfRange { index: usize, len: usize },

    #[error("goal handle {slot}v{generation} does not refer to a queued goal")]
    StaleHandle { slot: u32, generation: u32 },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("invalid region config: {0}")]
    Config(#[from] ConfigError),
}
