//! Layer merge logic
//!
//! Field-wise precedence: a value present in the higher layer wins,
//! otherwise the lower layer's value is kept. Lists replace, they are not
//! concatenated.

use super::overlay::OptionLayer;

/// Merge `higher` over `base`.
pub fn overlay(base: OptionLayer, higher: OptionLayer) -> OptionLayer {
    OptionLayer {
        repository: higher.repository.or(base.repository),
        username: higher.username.or(base.username),
        password: higher.password.or(base.password),
        platform: higher.platform.or(base.platform),
        output_dir: higher.output_dir.or(base.output_dir),
        replace_files: higher.replace_files.or(base.replace_files),
        clean: higher.clean.or(base.clean),
        extra_symbols: higher.extra_symbols.or(base.extra_symbols),
        endpoint: higher.endpoint.or(base.endpoint),
        poll_attempts: higher.poll_attempts.or(base.poll_attempts),
        poll_interval_seconds: higher.poll_interval_seconds.or(base.poll_interval_seconds),
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<OptionLayer>) -> OptionLayer {
    layers.into_iter().fold(OptionLayer::default(), overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_higher_wins() {
        let base = OptionLayer {
            platform: Some("LPC1768".to_string()),
            ..Default::default()
        };
        let higher = OptionLayer {
            platform: Some("K64F".to_string()),
            ..Default::default()
        };
        assert_eq!(overlay(base, higher).platform.as_deref(), Some("K64F"));
    }

    #[test]
    fn test_absent_falls_through() {
        let base = OptionLayer {
            username: Some("alice".to_string()),
            clean: Some(true),
            ..Default::default()
        };
        let merged = overlay(base, OptionLayer::default());
        assert_eq!(merged.username.as_deref(), Some("alice"));
        assert_eq!(merged.clean, Some(true));
    }

    #[test]
    fn test_lists_replace() {
        let base = OptionLayer {
            replace_files: Some(vec![PathBuf::from("a.c"), PathBuf::from("b.c")]),
            ..Default::default()
        };
        let higher = OptionLayer {
            replace_files: Some(vec![PathBuf::from("x.c")]),
            ..Default::default()
        };
        assert_eq!(overlay(base, higher).replace_files, Some(vec![PathBuf::from("x.c")]));
    }

    #[test]
    fn test_merge_layers() {
        let home = OptionLayer {
            platform: Some("LPC1768".to_string()),
            poll_attempts: Some(10),
            ..Default::default()
        };
        let cwd = OptionLayer {
            platform: Some("K64F".to_string()),
            ..Default::default()
        };
        let cli = OptionLayer {
            poll_attempts: Some(3),
            ..Default::default()
        };

        let merged = merge_layers(vec![home, cwd, cli]);
        assert_eq!(merged.platform.as_deref(), Some("K64F"));
        assert_eq!(merged.poll_attempts, Some(3));
        assert!(merged.repository.is_none());
    }

    #[test]
    fn test_merge_no_layers() {
        assert_eq!(merge_layers(Vec::new()), OptionLayer::default());
    }
}
