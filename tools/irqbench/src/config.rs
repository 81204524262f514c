//! Configuration loading for irqbench.
//!
//! Parses an optional `irqbench.toml` describing which tracepoint measures
//! what and how the reduction is parameterised. Every section is optional;
//! missing values fall back to the layout of the IRQ benchmark (overhead
//! tracepoint 0, path tracepoints 1 and 2).
//!
//! `scale` and `estimator` only apply to kernel logs. User-level runs always
//! subtract the overhead minimum once per run.
//!
//! ```toml
//! [layout]
//! num-tags = 3
//! overhead-tag = 0
//! path-tags = [1, 2]
//!
//! [reduce]
//! ignored = 10
//! scale = 2
//! estimator = "mean"
//! ```

use anyhow::{Context, Result, ensure};
use irqbench_reduce::pipeline::DEFAULT_IGNORED;
use irqbench_reduce::{Estimator, MAX_TAGS, ReduceConfig, TagId, TracepointLayout};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub reduce: ReduceSection,
}

/// `[layout]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default = "default_num_tags", rename = "num-tags")]
    pub num_tags: usize,
    #[serde(default, rename = "overhead-tag")]
    pub overhead_tag: u16,
    #[serde(default = "default_path_tags", rename = "path-tags")]
    pub path_tags: Vec<u16>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            num_tags: default_num_tags(),
            overhead_tag: 0,
            path_tags: default_path_tags(),
        }
    }
}

fn default_num_tags() -> usize {
    3
}
fn default_path_tags() -> Vec<u16> {
    vec![1, 2]
}

/// `[reduce]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReduceSection {
    #[serde(default = "default_ignored")]
    pub ignored: usize,
    /// Kernel logs only.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Kernel logs only.
    #[serde(default)]
    pub estimator: Option<Estimator>,
}

impl Default for ReduceSection {
    fn default() -> Self {
        Self {
            ignored: default_ignored(),
            scale: None,
            estimator: None,
        }
    }
}

fn default_ignored() -> usize {
    DEFAULT_IGNORED
}

impl BenchConfig {
    /// Load and validate the configuration file, or use the defaults when
    /// no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                let config = Self::parse(&text)
                    .with_context(|| format!("in config {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parsing TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        ensure!(layout.num_tags > 0, "layout.num-tags must be at least 1");
        ensure!(
            layout.num_tags <= MAX_TAGS,
            "layout.num-tags must be at most {MAX_TAGS}"
        );
        ensure!(
            usize::from(layout.overhead_tag) < layout.num_tags,
            "layout.overhead-tag {} is outside the {} configured tracepoints",
            layout.overhead_tag,
            layout.num_tags
        );
        ensure!(!layout.path_tags.is_empty(), "layout.path-tags must not be empty");
        for &tag in &layout.path_tags {
            ensure!(
                usize::from(tag) < layout.num_tags,
                "layout.path-tags entry {tag} is outside the {} configured tracepoints",
                layout.num_tags
            );
            ensure!(
                tag != layout.overhead_tag,
                "tracepoint {tag} is both the overhead and a path tracepoint"
            );
        }
        if let Some(scale) = self.reduce.scale {
            ensure!(scale > 0, "reduce.scale must be at least 1");
        }
        Ok(())
    }

    /// The tracepoint layout of kernel logs.
    pub fn layout(&self) -> TracepointLayout {
        TracepointLayout {
            num_tags: self.layout.num_tags,
            overhead: TagId(self.layout.overhead_tag),
            path: self.layout.path_tags.iter().copied().map(TagId).collect(),
        }
    }

    /// Reduction parameters for kernel logs, with command-line overrides
    /// applied.
    pub fn kernel_reduce_config(
        &self,
        ignored: Option<usize>,
        scale: Option<u32>,
    ) -> ReduceConfig {
        ReduceConfig {
            ignored: ignored.unwrap_or(self.reduce.ignored),
            scale: scale.or(self.reduce.scale),
            estimator: self.reduce.estimator,
        }
    }

    /// Reduction parameters for user-level runs. Only the warm-up count is
    /// taken from the file.
    pub fn user_reduce_config(&self, ignored: Option<usize>) -> ReduceConfig {
        ReduceConfig {
            ignored: ignored.unwrap_or(self.reduce.ignored),
            scale: Some(1),
            estimator: Some(Estimator::Min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = BenchConfig::parse("").unwrap();
        assert_eq!(config.layout(), TracepointLayout::default());
        assert_eq!(config.kernel_reduce_config(None, None), ReduceConfig::default());
    }

    #[test]
    fn full_config() {
        let config = BenchConfig::parse(
            r#"
            [layout]
            num-tags = 4
            overhead-tag = 3
            path-tags = [0, 1, 2]

            [reduce]
            ignored = 2
            scale = 3
            estimator = "min"
            "#,
        )
        .unwrap();
        let layout = config.layout();
        assert_eq!(layout.overhead, TagId(3));
        assert_eq!(layout.path, vec![TagId(0), TagId(1), TagId(2)]);
        let reduce = config.kernel_reduce_config(None, None);
        assert_eq!(reduce.ignored, 2);
        assert_eq!(reduce.scale, Some(3));
        assert_eq!(reduce.estimator, Some(Estimator::Min));
    }

    #[test]
    fn command_line_overrides_file() {
        let config = BenchConfig::parse("[reduce]\nignored = 2\nscale = 3\n").unwrap();
        let reduce = config.kernel_reduce_config(Some(5), Some(1));
        assert_eq!(reduce.ignored, 5);
        assert_eq!(reduce.scale, Some(1));
    }

    #[test]
    fn user_runs_ignore_kernel_overhead_settings() {
        let config = BenchConfig::parse(
            r#"
            [reduce]
            ignored = 2
            scale = 3
            estimator = "mean"
            "#,
        )
        .unwrap();
        let reduce = config.user_reduce_config(None);
        assert_eq!(reduce.ignored, 2);
        assert_eq!(reduce.scale, Some(1));
        assert_eq!(reduce.estimator, Some(Estimator::Min));
        assert_eq!(config.user_reduce_config(Some(4)).ignored, 4);
    }

    #[test]
    fn rejects_tag_count_beyond_id_space() {
        let err = BenchConfig::parse("[layout]\nnum-tags = 70000\n").unwrap_err();
        assert!(format!("{err:#}").contains("at most 65536"));
    }

    #[test]
    fn rejects_tag_outside_layout() {
        let err = BenchConfig::parse("[layout]\nnum-tags = 2\npath-tags = [1, 2]\n").unwrap_err();
        assert!(format!("{err:#}").contains("outside the 2 configured"));
    }

    #[test]
    fn rejects_overlapping_overhead_and_path() {
        assert!(BenchConfig::parse("[layout]\npath-tags = [0, 1]\n").is_err());
    }

    #[test]
    fn rejects_zero_scale() {
        assert!(BenchConfig::parse("[reduce]\nscale = 0\n").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(BenchConfig::parse("[reduce]\nwarmup = 3\n").is_err());
    }
}
