//! Rendering of command output.

use clap::ValueEnum;
use serde::Serialize;
use tokenfed_core::{AuthStatus, ErrorKind, ProviderAlias, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct TokenOutput<'a> {
    pub scope: Scope,
    pub alias: &'a ProviderAlias,
    pub token: &'a str,
}

/// Render a token. Text output is the bare token so it can be captured by
/// shell substitution.
pub fn render_token(output: &TokenOutput<'_>, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(output.token.to_string()),
        OutputFormat::Json => serde_json::to_string(output),
    }
}

pub fn render_status(status: &AuthStatus) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    let mut out = format!(
        "Storage backend:   {}\n\
         Client credentials: {}\n\
         Vault settings:    {}\n\
         Static token:      {}\n",
        status.backend,
        yes_no(status.credentials_configured),
        yes_no(status.vault_configured),
        yes_no(status.static_token_configured),
    );

    if status.tokens.is_empty() {
        out.push_str("Cached tokens:     none\n");
    } else {
        out.push_str("Cached tokens:\n");
        for token in &status.tokens {
            out.push_str(&format!(
                "  {:<16} {:<10} {} ({})\n",
                token.alias.as_str(),
                token.scope.as_str(),
                token.expires_at.to_rfc3339(),
                if token.valid { "valid" } else { "expired" },
            ));
        }
    }
    out
}

/// Follow-up advice for an error kind, if there is any.
pub fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::SetupRequired => Some(
            "Run `tokenfed setup --id <CLIENT_ID> --secret <CLIENT_SECRET>` \
             (or `tokenfed configure ...` for Vault and GitHub) first.",
        ),
        ErrorKind::Transient => Some("The identity provider could not be reached; try again."),
        ErrorKind::Rejected => Some("The identity provider refused the credentials; check them."),
        ErrorKind::InvalidInput | ErrorKind::Internal => None,
    }
}
