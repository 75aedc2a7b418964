use crate::action::Action;
use crate::app::Mode;

pub struct CommandParser;

impl CommandParser {
    pub fn parse(input: &str) -> Result<Action, String> {
        let input = input.trim();
        if !input.starts_with('/') {
            return Err("Not a command".to_string());
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let args = args.trim();

        match cmd {
            "/general" => Ok(Action::SwitchMode(Mode::General)),
            "/price" => Ok(Action::SwitchMode(Mode::Price)),
            "/nearby" => Ok(Action::SwitchMode(Mode::Nearby)),
            "/locate" => {
                if args.is_empty() {
                    Ok(Action::Locate { query: None })
                } else {
                    Ok(Action::Locate { query: Some(args.to_string()) })
                }
            }
            "/range" => {
                let mut parts = args.split_whitespace();
                match (parts.next().map(str::parse), parts.next().map(str::parse)) {
                    (Some(Ok(min)), Some(Ok(max))) => Ok(Action::SetRange { min, max }),
                    _ => Err("Usage: /range <min> <max>\n  Example: /range 0 25".to_string()),
                }
            }
            "/key" => {
                if args.is_empty() {
                    Ok(Action::ApiKey { value: None })
                } else {
                    Ok(Action::ApiKey { value: Some(args.to_string()) })
                }
            }
            "/clear" => Ok(Action::ClearChat),
            "/help" => Ok(Action::Help),
            "/quit" => Ok(Action::Quit),
            _ => Err(format!("Unknown command: {}. Type /help for available commands.", cmd)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_commands() {
        assert_eq!(CommandParser::parse("/general"), Ok(Action::SwitchMode(Mode::General)));
        assert_eq!(CommandParser::parse("/price"), Ok(Action::SwitchMode(Mode::Price)));
        assert_eq!(CommandParser::parse("/nearby"), Ok(Action::SwitchMode(Mode::Nearby)));
    }

    #[test]
    fn test_parse_locate_variants() {
        assert_eq!(CommandParser::parse("/locate"), Ok(Action::Locate { query: None }));
        assert_eq!(
            CommandParser::parse("/locate 560001 Bengaluru"),
            Ok(Action::Locate { query: Some("560001 Bengaluru".to_string()) })
        );
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(CommandParser::parse("/range 5 30"), Ok(Action::SetRange { min: 5, max: 30 }));
        assert!(CommandParser::parse("/range 5").is_err());
        assert!(CommandParser::parse("/range five thirty").is_err());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(CommandParser::parse("/key"), Ok(Action::ApiKey { value: None }));
        assert_eq!(
            CommandParser::parse("/key abc123"),
            Ok(Action::ApiKey { value: Some("abc123".to_string()) })
        );
    }

    #[test]
    fn test_unknown_command() {
        let result = CommandParser::parse("/frobnicate");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown command"));
    }
}
