//! Merging command-line options over the loaded run configuration.
//!
//! Precedence:
//! 1. CLI arguments
//! 2. Config file (`--config` or ./ipm-train.toml)
//! 3. Defaults

use crate::Args;
use ipm_training::RunConfig;

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Args {
    /// Apply every option given on the command line to `config`.
    ///
    /// Switches can only be turned on from the command line.
    pub fn apply_to(self, mut config: RunConfig) -> RunConfig {
        config.hadoop_root = self.hadoop_root.or(config.hadoop_root);
        config.streaming_jar = self.streaming_jar.or(config.streaming_jar);
        override_with(&mut config.refr_bin, self.refr_bin);
        config.devel_data = self.devel_data.or(config.devel_data);
        if !self.inputs.is_empty() {
            config.inputs = self.inputs;
        }
        config.hdfs_input_dir = self.hdfs_input_dir.or(config.hdfs_input_dir);
        config.hdfs_output_dir = self.hdfs_output_dir.or(config.hdfs_output_dir);
        config.output_dir = self.output_dir.or(config.output_dir);
        config.input_model = self.input_model.or(config.input_model);
        override_with(&mut config.start_iteration, self.start_iteration);
        override_with(&mut config.model_name, self.model_name);
        override_with(&mut config.max_iterations, self.max_iterations);
        override_with(&mut config.num_reducers, self.num_reducers);
        if self.lib_path.is_some() {
            config.lib_path = self.lib_path;
        }
        override_with(&mut config.split_size, self.split_size);
        override_with(&mut config.task_timeout, self.task_timeout);
        override_with(&mut config.max_decline, self.max_decline);

        config.force |= self.force;
        config.force_compile |= self.force_compile;
        config.compile_features |= self.compile_features;
        config.stop_on_decline |= self.stop_on_decline;
        if self.no_weighted_loss {
            config.weighted_loss = false;
        }

        config.model_config = self.model_config.or(config.model_config);
        config.train_config = self.train_config.or(config.train_config);
        config.dev_config = self.dev_config.or(config.dev_config);
        if !self.mapper_files.is_empty() {
            config.mapper_files = self.mapper_files;
        }
        config.log_level = self.log_level.or(config.log_level);
        config
    }
}
