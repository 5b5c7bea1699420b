// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_teleinfo::config::{self, Config};

#[test]
fn test_config_schema_output() -> Result<()> {
    config::output_config_schema()?;
    Ok(())
}

#[test]
fn test_sample_yaml_matches_schema() -> Result<()> {
    let yaml = serde_yml::to_string(&Config::default())?;
    Config::validate_yaml(&yaml)?;

    let with_overrides = r#"
acquisition:
  source: mock
  mock_frame_period_ms: 200
aggregation:
  interval_secs: 60
  window_capacity: 64
  overflow_policy: wrap
persistence:
  enabled: false
  database: ""
  table: teleinfo_test
"#;
    Config::validate_yaml(with_overrides)?;
    Ok(())
}
