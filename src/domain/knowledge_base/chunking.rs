//! Chunking strategies applied by the service during ingestion

use serde::{Deserialize, Serialize};

/// How a data source's documents are split before embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Send no chunking configuration and let the service choose
    ServiceDefault,
    /// Each file is one chunk
    None,
    FixedSize {
        max_tokens: i32,
        overlap_percentage: i32,
    },
    Hierarchical {
        parent_max_tokens: i32,
        child_max_tokens: i32,
        overlap_tokens: i32,
    },
    Semantic {
        max_tokens: i32,
        buffer_size: i32,
        breakpoint_percentile_threshold: i32,
    },
}

impl ChunkingStrategy {
    pub fn fixed_size() -> Self {
        Self::FixedSize {
            max_tokens: 512,
            overlap_percentage: 20,
        }
    }

    pub fn hierarchical() -> Self {
        Self::Hierarchical {
            parent_max_tokens: 1500,
            child_max_tokens: 300,
            overlap_tokens: 60,
        }
    }

    pub fn semantic() -> Self {
        Self::Semantic {
            max_tokens: 300,
            buffer_size: 0,
            breakpoint_percentile_threshold: 95,
        }
    }

    /// Wire name of the strategy, `None` for the service default
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Self::ServiceDefault => None,
            Self::None => Some("NONE"),
            Self::FixedSize { .. } => Some("FIXED_SIZE"),
            Self::Hierarchical { .. } => Some("HIERARCHICAL"),
            Self::Semantic { .. } => Some("SEMANTIC"),
        }
    }
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        Self::fixed_size()
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceDefault => write!(f, "service default"),
            Self::None => write!(f, "none"),
            Self::FixedSize {
                max_tokens,
                overlap_percentage,
            } => write!(f, "fixed size ({} tokens, {}% overlap)", max_tokens, overlap_percentage),
            Self::Hierarchical {
                parent_max_tokens,
                child_max_tokens,
                overlap_tokens,
            } => write!(
                f,
                "hierarchical ({}/{} tokens, {} overlap)",
                parent_max_tokens, child_max_tokens, overlap_tokens
            ),
            Self::Semantic {
                max_tokens,
                buffer_size,
                breakpoint_percentile_threshold,
            } => write!(
                f,
                "semantic ({} tokens, buffer {}, breakpoint {}%)",
                max_tokens, buffer_size, breakpoint_percentile_threshold
            ),
        }
    }
}
