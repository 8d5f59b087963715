use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A participant's opinion of a single candidate.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Good,
    Soso,
    Bad,
    Never,
}

impl Choice {
    /// Contribution of one such vote to a candidate's ranking score.
    pub fn rank_weight(self) -> i64 {
        match self {
            Self::Good => 1,
            Self::Soso => 0,
            Self::Bad => -2,
            Self::Never => -100,
        }
    }

    /// Component value used when comparing two participants' vote vectors.
    pub fn affinity_weight(self) -> i64 {
        match self {
            Self::Good => 3,
            Self::Soso => 1,
            Self::Bad => -1,
            Self::Never => -3,
        }
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Good => "good",
            Self::Soso => "soso",
            Self::Bad => "bad",
            Self::Never => "never",
        };
        f.write_str(name)
    }
}
