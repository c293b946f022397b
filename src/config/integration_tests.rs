// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::{load_and_validate_config, load_config, PipelineConfig};
    use crate::errors::ConfigError;
    use crate::stages::StageFactory;
    use crate::traits::Stage;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    /// The shipped demo configuration loads and validates.
    #[test]
    fn test_demo_yaml_loading() {
        let config = load_and_validate_config("configs/pipeline.yaml").unwrap();

        assert_eq!(config.channels.get_encoder_to_inference_depth(), 4);
        assert_eq!(config.stages.encoder.latency, 4);
        assert_eq!(config.stages.compositor.samples_per_ray, 8);
        assert_eq!(config.reshaper.step_size, 0.1);
        assert_eq!(config.runtime.tick_period_us, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
stages:
  inference:
    hidden: 8
runtime:
  tick_period_us: 250
"#,
        );
        let config = load_and_validate_config(file.path()).unwrap();
        let defaults = PipelineConfig::default();

        assert_eq!(config.stages.inference.hidden, 8);
        assert_eq!(config.stages.inference.latency, 0);
        assert_eq!(config.stages.encoder, defaults.stages.encoder);
        assert_eq!(config.channels, defaults.channels);
        assert_eq!(config.runtime.tick_period_us, Some(250));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("configs/does-not-exist.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let file = write_config("channels: [not, a, map]\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    /// `load_config` accepts what `load_and_validate_config` rejects.
    #[test]
    fn test_validation_is_separate_from_loading() {
        let file = write_config("channels:\n  output_depth: 0\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.channels.get_output_depth(), 0);

        match load_and_validate_config(file.path()) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "channels.output_depth")
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    /// Stages built from a loaded file match its dimensions.
    #[test]
    fn test_factory_builds_from_loaded_config() {
        let file = write_config(
            r#"
stages:
  encoder:
    frequencies: 1
  compositor:
    latency: 3
"#,
        );
        let config = load_and_validate_config(file.path()).unwrap();

        let encoder = StageFactory::create_encoder(&config.stages.encoder);
        let inference = StageFactory::create_inference(&config.stages);
        let compositor = StageFactory::create_compositor(&config.stages.compositor);

        assert_eq!(encoder.name(), "position_encoder");
        assert_eq!(inference.name(), "dense_inference");
        assert_eq!(compositor.name(), "volume_compositor");
    }
}
