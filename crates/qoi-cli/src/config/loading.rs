use crate::cli::BuildArgs;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Serialized},
    value::{Uncased, UncasedStr},
};
use qoi_bundler::BuildOptions;

/// Prefix of the environment variables that override build options,
/// e.g. `QOI_OUT_DIR=lib` or `QOI_DTS=only`.
pub const ENV_PREFIX: &str = "QOI_";

/// Variables sharing the prefix that configure something other than options.
const RESERVED_VARS: &[&str] = &["CONFIG_ROOT"];

/// The layered provider stack, before extraction.
pub fn options_figment(args: &BuildArgs) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BuildOptions::default()))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .filter(|key| {
                    !RESERVED_VARS
                        .iter()
                        .any(|reserved| key.as_str().eq_ignore_ascii_case(reserved))
                })
                .map(env_key),
        )
        // Only flags that were actually given are serialized.
        .merge(Serialized::defaults(args))
}

/// `OUT_DIR` → `outDir`, matching the serialized option names.
fn env_key(key: &UncasedStr) -> Uncased<'_> {
    let mut name = String::with_capacity(key.as_str().len());
    for (i, word) in key.as_str().split('_').filter(|w| !w.is_empty()).enumerate() {
        let word = word.to_ascii_lowercase();
        if i == 0 {
            name.push_str(&word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                name.push(first.to_ascii_uppercase());
                name.push_str(chars.as_str());
            }
        }
    }
    Uncased::from_owned(name)
}

/// Load the options for one `qoi build` invocation.
pub fn load_build_options(args: &BuildArgs) -> Result<BuildOptions> {
    let mut options: BuildOptions = options_figment(args).extract().map_err(|e| {
        let field = if e.path.is_empty() {
            "options".to_string()
        } else {
            e.path.join(".")
        };
        ConfigError::InvalidValue {
            field,
            value: e.kind.to_string(),
            hint: "Check the command-line flags and QOI_* environment variables".to_string(),
        }
    })?;

    if args.no_write {
        options.write = false;
    }

    options.formats().map_err(|e| ConfigError::InvalidValue {
        field: "format".to_string(),
        value: options.format.clone(),
        hint: format!("{e}. Use a comma separated list of es and cjs"),
    })?;

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_keys_are_camel_cased() {
        assert_eq!(env_key(UncasedStr::new("OUT_DIR")).as_str(), "outDir");
        assert_eq!(env_key(UncasedStr::new("CLEAN_OUT_DIR")).as_str(), "cleanOutDir");
        assert_eq!(env_key(UncasedStr::new("DTS")).as_str(), "dts");
    }
}
