use serde::{Deserialize, Serialize};

use crate::DialogCogError;

/// Default size above which an unsorted leaf is cracked on seek
pub const DEFAULT_CRACK_THRESHOLD: usize = 256;

/// Default size at or below which an unsorted leaf is promoted on seek
pub const DEFAULT_SORT_THRESHOLD: usize = 256;

/// Thresholds that drive a [`CrackingPolicy`].
///
/// Missing fields take their defaults when deserialized.
///
/// [`CrackingPolicy`]: crate::CrackingPolicy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackingSettings {
    /// Unsorted leaves holding more tuples than this are split around a
    /// sampled pivot.
    pub crack_threshold: usize,
    /// Unsorted leaves holding at most this many tuples are sorted.
    pub sort_threshold: usize,
}

impl CrackingSettings {
    /// Check that these settings describe a usable policy.
    pub fn validate(&self) -> Result<(), DialogCogError> {
        if self.crack_threshold == 0 {
            return Err(DialogCogError::InvalidSettings(
                "crack_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CrackingSettings {
    fn default() -> Self {
        CrackingSettings {
            crack_threshold: DEFAULT_CRACK_THRESHOLD,
            sort_threshold: DEFAULT_SORT_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::{CrackingSettings, DEFAULT_SORT_THRESHOLD};
    use crate::DialogCogError;

    #[test]
    fn it_fills_in_missing_fields_with_defaults() -> Result<()> {
        let settings: CrackingSettings = serde_json::from_str(r#"{ "crack_threshold": 32 }"#)?;

        assert_eq!(settings.crack_threshold, 32);
        assert_eq!(settings.sort_threshold, DEFAULT_SORT_THRESHOLD);
        settings.validate()?;

        Ok(())
    }

    #[test]
    fn it_rejects_a_zero_crack_threshold() {
        let settings = CrackingSettings {
            crack_threshold: 0,
            sort_threshold: 1,
        };

        assert!(matches!(
            settings.validate(),
            Err(DialogCogError::InvalidSettings(_))
        ));
    }
}
