//! Credential redaction for MCP server configs written into profiles

use serde_json::Value;

/// Turns literal credentials in a server config into environment references
pub trait SecretRedactor {
    /// Return a copy of `config` (the JSON config of server `server`) with
    /// credential-shaped values replaced
    fn redact(&self, server: &str, config: &Value) -> Value;
}

/// Key-name fragments that mark a value as a credential
const SECRET_KEY_MARKERS: &[&str] = &["TOKEN", "KEY", "SECRET", "PASSWORD", "AUTH", "CREDENTIAL"];

/// Value prefixes of well-known credential formats
const SECRET_VALUE_PREFIXES: &[&str] = &[
    "sk-",
    "ghp_",
    "gho_",
    "github_pat_",
    "xoxb-",
    "xoxp-",
    "glpat-",
    "AKIA",
];

const BEARER: &str = "Bearer ";

/// Default redactor: replaces secrets with `${NAME}` references
///
/// `env` entries keep their own variable name (`GITHUB_TOKEN` becomes
/// `${GITHUB_TOKEN}`). Header and argument values become
/// `${SERVER_HEADER}` / `${SERVER_ARG_N}`. A `Bearer ` scheme is kept in
/// front of the reference. Values that already hold a `${...}` reference are
/// left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvRefRedactor;

impl EnvRefRedactor {
    /// `${SERVER_NAME}` style variable name for `server` and `field`
    #[must_use]
    pub fn env_var_name(server: &str, field: &str) -> String {
        format!("{}_{}", env_ident(server), env_ident(field))
    }
}

impl SecretRedactor for EnvRefRedactor {
    fn redact(&self, server: &str, config: &Value) -> Value {
        let mut config = config.clone();
        let Some(object) = config.as_object_mut() else {
            return config;
        };

        if let Some(env) = object.get_mut("env").and_then(Value::as_object_mut) {
            for (key, value) in env.iter_mut() {
                if value.as_str().is_some_and(|v| is_secret(key, v)) {
                    *value = Value::String(reference(key));
                }
            }
        }

        if let Some(headers) = object.get_mut("headers").and_then(Value::as_object_mut) {
            for (key, value) in headers.iter_mut() {
                let Some(text) = value.as_str() else { continue };
                if !is_secret(key, text) {
                    continue;
                }
                let var = reference(&EnvRefRedactor::env_var_name(server, key));
                *value = Value::String(if text.starts_with(BEARER) {
                    format!("{BEARER}{var}")
                } else {
                    var
                });
            }
        }

        if let Some(args) = object.get_mut("args").and_then(Value::as_array_mut) {
            for (idx, arg) in args.iter_mut().enumerate() {
                if arg.as_str().is_some_and(looks_like_secret_value) {
                    let field = format!("ARG_{idx}");
                    *arg = Value::String(reference(&EnvRefRedactor::env_var_name(server, &field)));
                }
            }
        }

        config
    }
}

fn reference(name: &str) -> String {
    format!("${{{name}}}")
}

fn env_ident(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn is_secret(key: &str, value: &str) -> bool {
    if value.trim().is_empty() || value.contains("${") {
        return false;
    }
    let key = key.to_ascii_uppercase();
    SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker)) || looks_like_secret_value(value)
}

fn looks_like_secret_value(value: &str) -> bool {
    if value.contains("${") {
        return false;
    }
    let value = value.strip_prefix(BEARER).unwrap_or(value);
    SECRET_VALUE_PREFIXES.iter().any(|prefix| value.starts_with(prefix))
}
