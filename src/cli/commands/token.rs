use std::io::Read;

use anyhow::Context;
use serde_json::json;

use crate::auth::{extract_bearer_token, TokenVerifier};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    let verifier = TokenVerifier::from_config(&config.auth)?;

    let input = if token == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read token from stdin")?;
        buf
    } else {
        token.to_string()
    };

    let claims = verifier.verify_token(bare_token(input.trim())?)?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "sub": claims.sub, "exp": claims.exp, "iss": claims.iss })
        ),
        OutputFormat::Text => println!("{}", claims.sub),
    }

    Ok(())
}

/// Accept either a bare token or a full `Bearer <token>` header value.
fn bare_token(input: &str) -> anyhow::Result<&str> {
    if input.contains(char::is_whitespace) {
        Ok(extract_bearer_token(Some(input))?)
    } else {
        Ok(input)
    }
}
