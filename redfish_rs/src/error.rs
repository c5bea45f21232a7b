//! Failure conditions and process return codes.
//!
//! Commands never pick an exit status themselves. They return a
//! [`Condition`], and the dispatcher turns it into a [`ReturnCode`] in one
//! place (`cli::dispatch::Dispatcher::handle_condition`).

use thiserror::Error;

use crate::client::ClientError;

/// Numeric result of a command. The discriminant is the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    Success = 0,
    ConfigurationFileError = 1,
    CommandDisabled = 2,
    InvalidCommandLineError = 3,
    InvalidFileFormattingError = 4,
    UserNotAdmin = 5,
    NoContentsFoundForOperation = 6,
    InvalidFileInputError = 7,
    NoChangesFoundOrMade = 8,
    NoValidInfoError = 9,
    CommandNotFound = 13,
    UndefinedClient = 21,
    InstanceNotFound = 23,
    NothingSelected = 24,
    InvalidSelection = 27,
    SessionExpired = 30,
    RetriesExhausted = 31,
    InvalidCredentials = 32,
    ServerUnreachable = 33,
    ResponseError = 34,
    MalformedResponse = 35,
    SameSettings = 40,
    MultipleServerConfigFailure = 41,
    InvalidMscFileInput = 42,
    FirmwareUpdateError = 43,
    BootOrderEntryError = 44,
    NicMissingOrConfigurationError = 45,
    NoCurrentSession = 46,
    FailureDuringCommit = 47,
    IncompatibleVersion = 48,
    EncryptionError = 49,
    GeneralError = 255,
}

impl ReturnCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ReturnCode::Success
    }
}

/// Every error a command, the session layer or the transport can raise.
#[derive(Debug, Error)]
pub enum Condition {
    #[error("{0}")]
    ConfigurationFile(String),

    #[error("Command '{name}' not found.")]
    CommandNotFound {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("{hint}")]
    CommandDisabled { name: String, hint: String },

    #[error("{0}")]
    InvalidCommandLine(String),

    /// Argument parsing already reported the problem to the user.
    #[error("{0}")]
    InvalidCommandLineOptions(String),

    #[error("Please login or pass credentials to complete the operation.")]
    CredentialsRequired,

    #[error("{0}")]
    InvalidFileFormatting(String),

    #[error("{0}")]
    InvalidFileInput(String),

    #[error("{0}")]
    NoContentsFoundForOperation(String),

    #[error("{0}")]
    NoChangesFoundOrMade(String),

    #[error("{0}")]
    NoDifferencesFound(String),

    #[error("{0}")]
    NoValidInfo(String),

    #[error("{0}")]
    SameSettings(String),

    #[error("{0}")]
    MultipleServerConfig(String),

    #[error("{0}")]
    InvalidMscFileInput(String),

    #[error("{0}")]
    FirmwareUpdate(String),

    #[error("{0}")]
    BootOrderMissingEntries(String),

    #[error("{0}")]
    NicMissingOrConfiguration(String),

    #[error("{0}")]
    NoCurrentSession(String),

    #[error("{0}")]
    FailureDuringCommit(String),

    #[error("{0}")]
    IncompatibleVersion(String),

    #[error("{0}")]
    Encryption(String),

    #[error("This command requires administrator privileges.")]
    UserNotAdmin,

    #[error("Please login before making a selection.")]
    UndefinedClient,

    #[error("No instances found for '{0}'.")]
    InstanceNotFound(String),

    #[error("No type currently selected. Please use the 'select' command to select a type.")]
    NothingSelected,

    #[error("{0}")]
    InvalidSelection(String),

    #[error("Current session has expired or is invalid, please login again.")]
    SessionExpired,

    #[error("Could not reach {0}, retries exhausted.")]
    RetriesExhausted(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    ServerUnreachable(String),

    #[error("{0}")]
    ResponseError(String),

    #[error("{0}")]
    MalformedResponse(String),

    /// Leave the shell (or the process) with the given code.
    #[error("exit requested")]
    Exit(ReturnCode),

    #[error(transparent)]
    General(#[from] anyhow::Error),
}

impl Condition {
    /// Exit status for this condition. Exhaustive on purpose: a new variant
    /// must be given a code before the crate builds.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Condition::ConfigurationFile(_) => ReturnCode::ConfigurationFileError,
            Condition::CommandNotFound { .. } => ReturnCode::CommandNotFound,
            Condition::CommandDisabled { .. } => ReturnCode::CommandDisabled,
            Condition::InvalidCommandLine(_)
            | Condition::InvalidCommandLineOptions(_)
            | Condition::CredentialsRequired => ReturnCode::InvalidCommandLineError,
            Condition::InvalidFileFormatting(_) => ReturnCode::InvalidFileFormattingError,
            Condition::InvalidFileInput(_) => ReturnCode::InvalidFileInputError,
            Condition::NoContentsFoundForOperation(_) => ReturnCode::NoContentsFoundForOperation,
            Condition::NoChangesFoundOrMade(_) | Condition::NoDifferencesFound(_) => {
                ReturnCode::NoChangesFoundOrMade
            }
            Condition::NoValidInfo(_) => ReturnCode::NoValidInfoError,
            Condition::SameSettings(_) => ReturnCode::SameSettings,
            Condition::MultipleServerConfig(_) => ReturnCode::MultipleServerConfigFailure,
            Condition::InvalidMscFileInput(_) => ReturnCode::InvalidMscFileInput,
            Condition::FirmwareUpdate(_) => ReturnCode::FirmwareUpdateError,
            Condition::BootOrderMissingEntries(_) => ReturnCode::BootOrderEntryError,
            Condition::NicMissingOrConfiguration(_) => ReturnCode::NicMissingOrConfigurationError,
            Condition::NoCurrentSession(_) => ReturnCode::NoCurrentSession,
            Condition::FailureDuringCommit(_) => ReturnCode::FailureDuringCommit,
            Condition::IncompatibleVersion(_) => ReturnCode::IncompatibleVersion,
            Condition::Encryption(_) => ReturnCode::EncryptionError,
            Condition::UserNotAdmin => ReturnCode::UserNotAdmin,
            Condition::UndefinedClient => ReturnCode::UndefinedClient,
            Condition::InstanceNotFound(_) => ReturnCode::InstanceNotFound,
            Condition::NothingSelected => ReturnCode::NothingSelected,
            Condition::InvalidSelection(_) => ReturnCode::InvalidSelection,
            Condition::SessionExpired => ReturnCode::SessionExpired,
            Condition::RetriesExhausted(_) => ReturnCode::RetriesExhausted,
            Condition::InvalidCredentials(_) => ReturnCode::InvalidCredentials,
            Condition::ServerUnreachable(_) => ReturnCode::ServerUnreachable,
            Condition::ResponseError(_) => ReturnCode::ResponseError,
            Condition::MalformedResponse(_) => ReturnCode::MalformedResponse,
            Condition::Exit(code) => *code,
            Condition::General(_) => ReturnCode::GeneralError,
        }
    }
}

impl From<ClientError> for Condition {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::Undefined => Condition::UndefinedClient,
            ClientError::SessionExpired => Condition::SessionExpired,
            ClientError::RetriesExhausted(url) => Condition::RetriesExhausted(url),
            ClientError::InvalidCredentials(_) => Condition::InvalidCredentials(message),
            ClientError::Unreachable { .. } => Condition::ServerUnreachable(message),
            ClientError::MalformedResponse { .. } => Condition::MalformedResponse(message),
            ClientError::Response { .. } => Condition::ResponseError(message),
            ClientError::InstanceNotFound(selector) => Condition::InstanceNotFound(selector),
            ClientError::Transport(_) => Condition::General(anyhow::anyhow!(message)),
        }
    }
}

impl From<std::io::Error> for Condition {
    fn from(err: std::io::Error) -> Self {
        Condition::General(err.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
