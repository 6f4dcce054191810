use chess::{PieceColor, DEFAULT_PLAN_LENGTH};
use engine::EngineConfig;

/// Default search depth for suggestions.
pub const DEFAULT_DEPTH: u32 = 15;

/// Settings for one assisted game.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// The side that receives suggestions.
    pub human: PieceColor,
    pub depth: u32,
    /// Plies shown per plan.
    pub plan_length: usize,
    pub engine: EngineConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            human: PieceColor::White,
            depth: DEFAULT_DEPTH,
            plan_length: DEFAULT_PLAN_LENGTH,
            engine: EngineConfig::default(),
        }
    }
}
