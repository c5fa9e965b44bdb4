use std::env::var;

/// Get the value of an ENV var, or compute a default
///
/// The default is used when the variable is unset or empty.
pub fn env_var_or_else<F>(var_name: &'static str, or_else: F) -> String
where
    F: FnOnce() -> String,
{
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}

/// Get the value of an ENV var, or a fixed default
pub fn env_var_or(var_name: &'static str, default: &str) -> String {
    env_var_or_else(var_name, || default.to_string())
}
