//! Helper functions for command parsing.
//!
//! - Shell-style splitting of interactive lines
//! - Running a command's clap definition over its argument slice

use clap::Parser;
use clap::error::ErrorKind;

use crate::error::Condition;

/// Splits a shell line on whitespace. Single or double quotes group text
/// (`AdminName="Jane Doe"` is one token) and are removed from the result.
pub fn split_line(line: &str) -> Result<Vec<String>, Condition> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(Condition::InvalidCommandLine(format!(
            "Invalid format: unterminated quote in '{}'",
            line
        )));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parses `args` with the clap definition `T`, using `name` as argv[0].
///
/// `Ok(None)` means clap printed help and the command should return
/// success without doing anything. Other parse failures are printed by clap
/// and reported as `InvalidCommandLineOptions`.
pub fn parse_command_args<T: Parser>(name: &str, args: &[String]) -> Result<Option<T>, Condition> {
    let argv = std::iter::once(name.to_string()).chain(args.iter().cloned());
    match T::try_parse_from(argv) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            | ErrorKind::DisplayVersion => {
                let _ = err.print();
                Ok(None)
            }
            kind => {
                let _ = err.print();
                Err(Condition::InvalidCommandLineOptions(kind.to_string()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Parser)]
    struct DemoArgs {
        #[arg(long)]
        reboot: Option<String>,
        #[arg(long)]
        userdefaults: bool,
    }

    #[test]
    fn test_split_line_plain() {
        assert_eq!(
            split_line("  set BootMode=Uefi   --commit ").unwrap(),
            vec!["set", "BootMode=Uefi", "--commit"]
        );
    }

    #[test]
    fn test_split_line_quotes_group_and_strip() {
        assert_eq!(
            split_line(r#"set AdminName="Jane Doe" 'x y'"#).unwrap(),
            vec!["set", "AdminName=Jane Doe", "x y"]
        );
        assert_eq!(split_line(r#"get """#).unwrap(), vec!["get", ""]);
    }

    #[test]
    fn test_split_line_unterminated_quote() {
        assert!(matches!(
            split_line("set AdminName=\"Jane"),
            Err(Condition::InvalidCommandLine(_))
        ));
    }

    #[test]
    fn test_parse_command_args_ok() {
        let parsed: DemoArgs = parse_command_args(
            "biosdefaults",
            &["--reboot".to_string(), "ForceRestart".to_string()],
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.reboot.as_deref(), Some("ForceRestart"));
        assert!(!parsed.userdefaults);
    }

    #[test]
    fn test_parse_command_args_help_is_not_an_error() {
        let parsed = parse_command_args::<DemoArgs>("biosdefaults", &["-h".to_string()]).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_command_args_unknown_flag() {
        let err = parse_command_args::<DemoArgs>("biosdefaults", &["--bogus".to_string()])
            .unwrap_err();
        assert!(matches!(err, Condition::InvalidCommandLineOptions(_)));
    }
}
