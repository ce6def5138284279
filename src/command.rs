use crate::Config;

const REDACTED_PASSWORD: &str = "-p<redacted>";

/// Arguments running `query` in batch mode.
pub(crate) fn query_args(config: &Config, query: &str) -> Vec<String> {
    let mut args = connection_args(config);
    args.push("-e".to_owned());
    args.push(query.to_owned());
    args.push(config.database.clone());
    args
}

/// Arguments running a script fed on stdin in batch mode.
pub(crate) fn script_args(config: &Config) -> Vec<String> {
    let mut args = connection_args(config);
    args.push(config.database.clone());
    args
}

fn connection_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        format!("-u{}", config.username),
        format!("-p{}", config.password),
        format!("-h{}", config.hostname),
    ];
    if let Some(encoding) = &config.encoding {
        args.push(format!("--default-character-set={encoding}"));
    }
    args.push("-B".to_owned());
    args
}

/// Masks the password argument for logging.
#[cfg_attr(not(any(test, feature = "tracing")), allow(dead_code))]
pub(crate) fn redact(args: &[String]) -> Vec<String> {
    let mut masked = false;
    args.iter()
        .map(|arg| {
            if !masked && arg.starts_with("-p") {
                masked = true;
                REDACTED_PASSWORD.to_owned()
            } else {
                arg.clone()
            }
        })
        .collect()
}
