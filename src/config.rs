use std::str::FromStr;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// 单次批量生成允许的最大版本数
    pub max_versions_per_batch: u32,
    /// 同时进行的打乱计算数量
    pub max_concurrent_trials: usize,
    /// 命令行运行时每个测试生成的版本数
    pub versions_per_test: u32,
    /// 每个版本的题目数上限（不设置则使用全部题目）
    pub questions_per_version: Option<usize>,
    /// 随机种子（不设置则使用系统熵）
    pub rng_seed: Option<u64>,
    /// 题库 TOML 文件目录
    pub bank_folder: String,
    /// 版本导出目录
    pub export_folder: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 答案键告警文件
    pub warn_file: String,
    /// 题库缓存有效期（秒）
    pub bank_cache_ttl_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_versions_per_batch: 100,
            max_concurrent_trials: 8,
            versions_per_test: 3,
            questions_per_version: None,
            rng_seed: None,
            bank_folder: "banks".to_string(),
            export_folder: "output_versions".to_string(),
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
            bank_cache_ttl_secs: 300,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺失的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let config = Self {
            max_versions_per_batch: parse_or(
                &lookup,
                "MAX_VERSIONS_PER_BATCH",
                default.max_versions_per_batch,
            )?,
            max_concurrent_trials: parse_or(
                &lookup,
                "MAX_CONCURRENT_TRIALS",
                default.max_concurrent_trials,
            )?,
            versions_per_test: parse_or(&lookup, "VERSIONS_PER_TEST", default.versions_per_test)?,
            questions_per_version: parse_optional(&lookup, "QUESTIONS_PER_VERSION")?,
            rng_seed: parse_optional(&lookup, "RNG_SEED")?,
            bank_folder: lookup("BANK_FOLDER").unwrap_or(default.bank_folder),
            export_folder: lookup("EXPORT_FOLDER").unwrap_or(default.export_folder),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            warn_file: lookup("WARN_FILE").unwrap_or(default.warn_file),
            bank_cache_ttl_secs: parse_or(
                &lookup,
                "BANK_CACHE_TTL_SECS",
                default.bank_cache_ttl_secs,
            )?,
            verbose_logging: parse_or(&lookup, "VERBOSE_LOGGING", default.verbose_logging)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置项之间的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_versions_per_batch == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_versions_per_batch",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.max_concurrent_trials == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_concurrent_trials",
                reason: "必须大于 0".to_string(),
            });
        }
        if !(1..=self.max_versions_per_batch).contains(&self.versions_per_test) {
            return Err(ConfigError::InvalidValue {
                name: "versions_per_test",
                reason: format!("必须在 [1, {}] 之间", self.max_versions_per_batch),
            });
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: std::any::type_name::<T>().to_string(),
    })
}

fn parse_or<T, F>(lookup: &F, var_name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(value) => parse_value(var_name, &value),
        None => Ok(default),
    }
}

fn parse_optional<T, F>(lookup: &F, var_name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(value) if !value.trim().is_empty() => parse_value(var_name, &value).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("VERSIONS_PER_TEST", "5"),
            ("QUESTIONS_PER_VERSION", "20"),
            ("RNG_SEED", "42"),
            ("BANK_FOLDER", "my_banks"),
            ("VERBOSE_LOGGING", "true"),
        ]))
        .unwrap();

        assert_eq!(config.versions_per_test, 5);
        assert_eq!(config.questions_per_version, Some(20));
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.bank_folder, "my_banks");
        assert!(config.verbose_logging);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let err =
            Config::from_lookup(lookup_from(&[("MAX_CONCURRENT_TRIALS", "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. }
                if var_name == "MAX_CONCURRENT_TRIALS"
        ));
    }

    #[test]
    fn test_versions_per_test_must_fit_batch_limit() {
        let err = Config::from_lookup(lookup_from(&[
            ("MAX_VERSIONS_PER_BATCH", "10"),
            ("VERSIONS_PER_TEST", "11"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "versions_per_test", .. }));
    }
}
