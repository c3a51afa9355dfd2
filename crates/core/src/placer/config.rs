//! Configuration for the placer module.

use serde::{Deserialize, Serialize};

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Highest numeric suffix tried for colliding names (`name_1` .. `name_N`).
    #[serde(default = "default_max_suffix")]
    pub max_suffix: u32,

    /// Chunk size in bytes for content comparison and cross-device copies.
    #[serde(default = "default_chunk_size")]
    pub compare_chunk_size: usize,

    /// Copy access and modification times on cross-device moves.
    #[serde(default = "default_true")]
    pub preserve_times: bool,

    /// Copy permission bits on cross-device moves.
    #[serde(default = "default_true")]
    pub preserve_permissions: bool,

    /// Permissions for created directories (Unix only, octal).
    #[serde(default = "default_dir_mode")]
    pub directory_mode: u32,
}

fn default_max_suffix() -> u32 {
    9
}

fn default_chunk_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_true() -> bool {
    true
}

fn default_dir_mode() -> u32 {
    0o755
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            max_suffix: default_max_suffix(),
            compare_chunk_size: default_chunk_size(),
            preserve_times: true,
            preserve_permissions: true,
            directory_mode: default_dir_mode(),
        }
    }
}

impl PlacerConfig {
    pub fn with_max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    pub fn with_compare_chunk_size(mut self, size: usize) -> Self {
        self.compare_chunk_size = size;
        self
    }

    pub fn with_preserve_times(mut self, enabled: bool) -> Self {
        self.preserve_times = enabled;
        self
    }

    pub fn with_preserve_permissions(mut self, enabled: bool) -> Self {
        self.preserve_permissions = enabled;
        self
    }

    pub fn with_directory_mode(mut self, mode: u32) -> Self {
        self.directory_mode = mode;
        self
    }
}
