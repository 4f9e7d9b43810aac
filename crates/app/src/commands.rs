//! Interactive command parsing.

use std::str::FromStr;

use gatekeep_domain::HttpMethod;
use serde_json::Value;
use thiserror::Error;

/// Usage text printed by `help`.
pub const HELP: &str = "\
Commands:
  login <username> <password>     sign in
  get|head|options <path>         send a request
  post|put|patch|delete <path> [json]
                                  send a request with an optional JSON body
  whoami                          show the signed-in user
  logout                          sign out
  help                            show this text
  quit                            exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in.
    Login {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },
    /// Send an API request.
    Request {
        /// HTTP method.
        method: HttpMethod,
        /// Path relative to the base URL, or an absolute URL.
        path: String,
        /// JSON body.
        body: Option<Value>,
    },
    /// Show the signed-in user.
    WhoAmI,
    /// Sign out.
    Logout,
    /// Show usage.
    Help,
    /// Exit.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Blank input.
    #[error("empty command")]
    Empty,

    /// Unknown verb.
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// The body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// A body was given for a method that takes none.
    #[error("{0} requests take no body")]
    UnexpectedBody(HttpMethod),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(username), Some(password), None) => Ok(Self::Login {
                        username: username.to_string(),
                        password: password.to_string(),
                    }),
                    _ => Err(ParseError::Usage("login <username> <password>")),
                }
            }
            "whoami" => Ok(Self::WhoAmI),
            "logout" => Ok(Self::Logout),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => match other.parse::<HttpMethod>() {
                Ok(method) => parse_request(method, rest),
                Err(_) => Err(ParseError::Unknown(verb.to_string())),
            },
        }
    }
}

fn parse_request(method: HttpMethod, rest: &str) -> Result<Command, ParseError> {
    let (path, body) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(path, body)| (path, body.trim()));
    if path.is_empty() {
        return Err(ParseError::Usage("<method> <path> [json]"));
    }

    let body = if body.is_empty() {
        None
    } else if method.is_mutating() {
        Some(serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?)
    } else {
        return Err(ParseError::UnexpectedBody(method));
    };

    Ok(Command::Request {
        method,
        path: path.to_string(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("whoami".parse::<Command>().unwrap(), Command::WhoAmI);
        assert_eq!("  LOGOUT ".parse::<Command>().unwrap(), Command::Logout);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("".parse::<Command>(), Err(ParseError::Empty));
        assert_eq!(
            "fly /moon".parse::<Command>(),
            Err(ParseError::Unknown("fly".to_string()))
        );
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            "login ada s3cret".parse::<Command>().unwrap(),
            Command::Login {
                username: "ada".to_string(),
                password: "s3cret".to_string(),
            }
        );

        assert_eq!(
            "login ada".parse::<Command>(),
            Err(ParseError::Usage("login <username> <password>"))
        );
    }

    #[test]
    fn test_parse_request_with_body() {
        let command = r#"post /items {"name": "widget", "tags": ["a b"]}"#
            .parse::<Command>()
            .unwrap();
        assert_eq!(
            command,
            Command::Request {
                method: HttpMethod::Post,
                path: "/items".to_string(),
                body: Some(json!({"name": "widget", "tags": ["a b"]})),
            }
        );
    }

    #[test]
    fn test_parse_request_errors() {
        assert_eq!(
            "get".parse::<Command>(),
            Err(ParseError::Usage("<method> <path> [json]"))
        );
        assert_eq!(
            "get /items {}".parse::<Command>(),
            Err(ParseError::UnexpectedBody(HttpMethod::Get))
        );
        assert!(matches!(
            "put /items/1 {oops".parse::<Command>(),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_delete_with_and_without_body() {
        assert_eq!(
            "delete /items/1".parse::<Command>().unwrap(),
            Command::Request {
                method: HttpMethod::Delete,
                path: "/items/1".to_string(),
                body: None,
            }
        );
        assert_eq!(
            "DELETE /items/1 {\"force\": true}".parse::<Command>().unwrap(),
            Command::Request {
                method: HttpMethod::Delete,
                path: "/items/1".to_string(),
                body: Some(json!({"force": true})),
            }
        );
    }
}
