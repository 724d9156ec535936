use std::fmt;

/// Domain failures carried inside `anyhow::Error`.
///
/// Callers that need to branch on the failure kind can
/// `err.downcast_ref::<GameError>()`; everything else just propagates with `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// Some registered assets never reported completion
    /// - the loader itself never raises this, it only reports it on request
    AssetLoadStall { pending: Vec<String> },
    /// `start_frame` was past `end_frame` when building an animation
    InvalidAnimationRange { start: u32, end: u32 },
    InvalidArgument(String),
    /// A sprite was drawn before its sheet image finished loading
    PrematureDraw { image: String },
    DuplicateAsset { key: String },
    UnknownAsset { key: String },
    /// Registration attempted after `load_all` already ran
    LoaderStarted,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::AssetLoadStall { pending } => {
                write!(f, "asset loading stalled, still pending : {:?}", pending)
            }
            GameError::InvalidAnimationRange { start, end } => write!(
                f,
                "invalid animation range : start frame {} is after end frame {}",
                start, end
            ),
            GameError::InvalidArgument(reason) => write!(f, "invalid argument : {}", reason),
            GameError::PrematureDraw { image } => {
                write!(f, "sprite sheet '{}' drawn before its image loaded", image)
            }
            GameError::DuplicateAsset { key } => write!(f, "asset '{}' registered twice", key),
            GameError::UnknownAsset { key } => write!(f, "no asset registered as '{}'", key),
            GameError::LoaderStarted => write!(f, "asset loader already started"),
        }
    }
}

impl std::error::Error for GameError {}
