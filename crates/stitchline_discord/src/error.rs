use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("No Discord bot token configured")]
    #[diagnostic(
        code(stitchline::discord::missing_token),
        help("Set DISCORD_TOKEN in the environment or `discord.token` in the config file")
    )]
    MissingToken,

    #[error("Discord authentication failed")]
    #[diagnostic(
        code(stitchline::discord::auth_failed),
        help("Check that your Discord bot token is valid and has not been regenerated")
    )]
    AuthenticationFailed {
        #[source]
        cause: serenity::Error,
        token_preview: String,
    },

    #[error("Discord client stopped")]
    #[diagnostic(
        code(stitchline::discord::client_stopped),
        help("The gateway connection ended; check the logs above for the cause")
    )]
    ClientStopped(#[source] serenity::Error),

    #[error("Message send failed")]
    #[diagnostic(
        code(stitchline::discord::message_send_failed),
        help("Failed to send message to {destination}")
    )]
    MessageSendFailed {
        destination: String,
        message_length: usize,
        #[source]
        cause: serenity::Error,
    },

    #[error("Command registration failed")]
    #[diagnostic(
        code(stitchline::discord::command_registration_failed),
        help("Failed to register slash command '{command_name}'")
    )]
    CommandRegistrationFailed {
        command_name: String,
        #[source]
        cause: serenity::Error,
    },
}

impl DiscordError {
    /// First and last few characters of a token, for log lines.
    pub fn token_preview(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() <= 8 {
            return "***".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

pub type Result<T> = std::result::Result<T, DiscordError>;
