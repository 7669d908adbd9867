//! Decoder configuration knobs.

/// Configuration threaded into [`crate::innodb::record_decoder::RecordDecoder`],
/// [`crate::tree_navigator::TreeNavigator`], and
/// [`crate::range_iterator::RangeIterator`].
#[derive(Debug, Clone, Copy)]
pub struct DecodeConfig {
    /// When `true`, a new-format `LOB_FIRST` overflow page aborts decoding
    /// with [`crate::IdbError::UnsupportedLobFormat`]. When `false` (the
    /// default), the affected column decodes to `FieldValue::Null` instead.
    pub throw_on_unsupported_new_lob: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            throw_on_unsupported_new_lob: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_soft_fail() {
        let cfg = DecodeConfig::default();
        assert!(!cfg.throw_on_unsupported_new_lob);
    }
}
