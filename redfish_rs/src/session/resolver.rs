//! Pre-flight credential resolution shared by every command that talks to
//! the server.
//!
//! Given the credential flags of a command, decide whether the existing
//! session can be reused or which tokens the login command should receive.

use clap::Args;

use super::SessionContext;
use crate::config::RedfishConfig;
use crate::error::Condition;

/// Credential flags accepted by every authenticating command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct CredentialArgs {
    /// Use the provided URL to login.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Username for the management controller.
    #[arg(short = 'u', long = "user", value_name = "USERNAME")]
    pub user: Option<String>,

    /// Password for the management controller.
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Username and password are base64 encoded.
    #[arg(short = 'e', long = "enc", hide = true)]
    pub encode: bool,
}

impl CredentialArgs {
    fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|v| !v.is_empty())
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref().filter(|v| !v.is_empty())
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|v| !v.is_empty())
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPlan {
    /// The current client is usable as is.
    Reuse,
    /// Run the login command with exactly these tokens.
    Login(Vec<String>),
}

pub fn resolve(
    session: &mut SessionContext,
    config: &RedfishConfig,
    creds: &CredentialArgs,
) -> Result<LoginPlan, Condition> {
    let mut creds = creds.clone();
    if creds.encode {
        if let (Some(user), Some(password)) = (creds.user(), creds.password()) {
            let codec = session.codec();
            let user = codec.decode(user)?;
            let password = codec.decode(password)?;
            creds.user = Some(user);
            creds.password = Some(password);
        }
    }

    let mut tokens = Vec::new();
    if let Ok(client) = session.client_mut() {
        if client.username().is_none() {
            if let Some(user) = creds.user() {
                client.set_username(user.to_string());
            }
        }
        if client.password().is_none() {
            if let Some(password) = creds.password() {
                client.set_password(password.to_string());
            }
        }
    } else if creds.url().is_some() || creds.user().is_some() || creds.password().is_some() {
        push_login_tokens(&mut tokens, creds.url(), creds.user(), creds.password());
    } else {
        push_login_tokens(
            &mut tokens,
            config.url(),
            config.username(),
            config.password(),
        );
    }

    if !tokens.is_empty() {
        Ok(LoginPlan::Login(tokens))
    } else if session.is_logged_in() {
        Ok(LoginPlan::Reuse)
    } else {
        Err(Condition::CredentialsRequired)
    }
}

fn push_login_tokens(
    tokens: &mut Vec<String>,
    url: Option<&str>,
    user: Option<&str>,
    password: Option<&str>,
) {
    if let Some(url) = url {
        tokens.push(url.to_string());
    }
    if let Some(user) = user {
        tokens.extend(["-u".to_string(), user.to_string()]);
    }
    if let Some(password) = password {
        tokens.extend(["-p".to_string(), password.to_string()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LoginRequest;
    use crate::client::mock::{MockConnector, MockState};
    use crate::codec::Base64Codec;

    fn session() -> SessionContext {
        SessionContext::new(
            Box::new(MockConnector::new(MockState::shared())),
            Box::new(Base64Codec),
            None,
            None,
        )
    }

    fn full_config() -> RedfishConfig {
        RedfishConfig {
            url: Some("https://10.0.0.100".into()),
            username: Some("cfguser".into()),
            password: Some("cfgpass".into()),
            ..RedfishConfig::default()
        }
    }

    #[test]
    fn test_explicit_user_skips_config() {
        let mut session = session();
        let creds = CredentialArgs {
            user: Some("admin".into()),
            ..CredentialArgs::default()
        };
        let plan = resolve(&mut session, &full_config(), &creds).unwrap();
        assert_eq!(plan, LoginPlan::Login(vec!["-u".into(), "admin".into()]));
    }

    #[test]
    fn test_config_fallback_skips_empty_values() {
        let mut session = session();
        let config = RedfishConfig {
            url: Some("https://10.0.0.100".into()),
            username: Some(String::new()),
            password: Some("secret".into()),
            ..RedfishConfig::default()
        };
        let plan = resolve(&mut session, &config, &CredentialArgs::default()).unwrap();
        assert_eq!(
            plan,
            LoginPlan::Login(vec![
                "https://10.0.0.100".into(),
                "-p".into(),
                "secret".into()
            ])
        );
    }

    #[test]
    fn test_nothing_available_requires_credentials() {
        let mut session = session();
        let err = resolve(
            &mut session,
            &RedfishConfig::default(),
            &CredentialArgs::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Condition::CredentialsRequired));
    }

    #[test]
    fn test_existing_client_credentials_are_never_overwritten() {
        let mut session = session();
        session
            .login(LoginRequest {
                url: "https://10.0.0.100".into(),
                username: Some("original".into()),
                password: None,
                proxy: None,
            })
            .unwrap();
        let creds = CredentialArgs {
            user: Some("intruder".into()),
            password: Some("newpass".into()),
            ..CredentialArgs::default()
        };
        let plan = resolve(&mut session, &full_config(), &creds).unwrap();
        assert_eq!(plan, LoginPlan::Reuse);

        let client = session.client().unwrap();
        assert_eq!(client.username(), Some("original"));
        assert_eq!(client.password(), Some("newpass"));
    }

    #[test]
    fn test_encoded_credentials_are_decoded_first() {
        let mut session = session();
        let creds = CredentialArgs {
            url: Some("10.0.0.100".into()),
            user: Some("YWRtaW4=".into()),
            password: Some("cGFzc3dvcmQ=".into()),
            encode: true,
        };
        let plan = resolve(&mut session, &RedfishConfig::default(), &creds).unwrap();
        assert_eq!(
            plan,
            LoginPlan::Login(vec![
                "10.0.0.100".into(),
                "-u".into(),
                "admin".into(),
                "-p".into(),
                "password".into()
            ])
        );
    }
}
