pub use self::parser::{
    Config, DatabaseConfig, DbType, LogFormat, LoggingConfig, PermissionConfig, SlackConfig,
    SsoRequirement,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
