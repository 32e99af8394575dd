/// Decoder behavior on recoverable faults.
///
/// The default maximizes recovery: faulted properties are replaced by
/// placeholders and decoding continues, so the rest of a damaged file stays
/// inspectable.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Abort with [`Error::FailFast`](crate::Error::FailFast) on the first
    /// recoverable fault instead of resynchronizing.
    pub fail_fast: bool,
    /// Regions larger than this are not hex-dumped in fault diagnostics.
    pub dump_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            dump_limit: 10_000,
        }
    }
}

impl DecodeOptions {
    pub fn fail_fast() -> Self {
        Self {
            fail_fast: true,
            ..Self::default()
        }
    }
}

/// Shape of the JSON projection of a decoded tree.
#[derive(Debug, Clone)]
pub struct ProjectionOptions {
    /// Emit each property list's tags under [`ProjectionOptions::tags_key`].
    /// Without them the projection cannot be re-encoded.
    pub include_tags: bool,
    pub tags_key: String,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            include_tags: true,
            tags_key: "__props__".to_string(),
        }
    }
}

impl ProjectionOptions {
    /// Values only, for presentation.
    pub fn values_only() -> Self {
        Self {
            include_tags: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favor_recovery_and_fidelity() {
        let decode = DecodeOptions::default();
        assert!(!decode.fail_fast);
        assert!(DecodeOptions::fail_fast().fail_fast);

        let projection = ProjectionOptions::default();
        assert!(projection.include_tags);
        assert!(!ProjectionOptions::values_only().include_tags);
    }
}
