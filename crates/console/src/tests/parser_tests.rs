use super::*;
use proptest::prelude::*;

#[test]
fn parses_flags_with_comma_separated_values() {
    let command = Command::parse("areOwners --addresses=0xaa,0xbb --verbose").expect("parse");
    assert_eq!(command.name, "areOwners");
    assert_eq!(command.priority_group, PriorityGroup::Typed);
    assert_eq!(command.arguments.len(), 2);
    assert_eq!(command.arguments[0].values, vec!["0xaa", "0xbb"]);
    assert!(command.arguments[1].values.is_empty());
    assert!(command.has_flag("verbose"));
}

#[test]
fn bare_tokens_extend_the_preceding_flag() {
    let command = Command::parse("areOwners --addresses=0xaa 0xbb,0xcc").expect("parse");
    assert_eq!(command.arguments.len(), 1);
    assert_eq!(
        command.values().collect::<Vec<_>>(),
        vec!["0xaa", "0xbb", "0xcc"]
    );
}

#[test]
fn identifier_values_stay_in_group_zero() {
    let command = Command::parse("loadContract --alias=dai_token").expect("parse");
    assert_eq!(command.priority_group, PriorityGroup::Identifier);
    assert_eq!(command.positional(0), Some("dai_token"));

    let bare = Command::parse("getOwners").expect("parse");
    assert_eq!(bare.priority_group, PriorityGroup::Identifier);
    assert!(bare.arguments.is_empty());
}

#[test]
fn integers_are_typed() {
    let command = Command::parse("changeThreshold --threshold=2").expect("parse");
    assert!(command.is_typed());
    assert_eq!(command.flag_value("threshold"), Some("2"));
}

#[test]
fn rejects_malformed_lines() {
    assert_eq!(Command::parse("   "), Err(ParseError::Empty));
    assert!(matches!(
        Command::parse("--address=0x1"),
        Err(ParseError::MissingCommand(_))
    ));
    assert!(matches!(
        Command::parse("1nfo"),
        Err(ParseError::InvalidCommand(_))
    ));
    assert!(matches!(
        Command::parse("isOwner 0xaa"),
        Err(ParseError::UnexpectedValue(_))
    ));
    assert!(matches!(
        Command::parse("isOwner --=0xaa"),
        Err(ParseError::InvalidFlag(_))
    ));
}

#[test]
fn empty_pieces_are_dropped() {
    let command = Command::parse("areOwners --addresses=,0xaa,,").expect("parse");
    assert_eq!(command.arguments[0].values, vec!["0xaa"]);
}

#[test]
fn display_renders_canonical_form() {
    let command = Command::parse("swapOwner   --old=0xaa\t--new=0xbb").expect("parse");
    assert_eq!(command.to_string(), "swapOwner --old=0xaa --new=0xbb");
}

fn line_strategy() -> impl Strategy<Value = String> {
    let name = "[a-zA-Z][a-zA-Z0-9_]{0,12}";
    let flag = "[a-z][a-z0-9_-]{0,8}";
    let value = prop_oneof!["0x[0-9a-f]{1,8}", "[0-9]{1,6}", "[a-z_]{1,6}"];
    let argument = (flag, prop::collection::vec(value, 0..3), any::<bool>()).prop_map(
        |(flag, values, bare_tail)| match (values.split_first(), bare_tail) {
            (Some((first, rest)), true) if !rest.is_empty() => {
                format!("--{flag}={first} {}", rest.join(","))
            }
            _ if values.is_empty() => format!("--{flag}"),
            _ => format!("--{flag}={}", values.join(",")),
        },
    );
    (name, prop::collection::vec(argument, 0..4)).prop_map(|(name, arguments)| {
        let mut line = name;
        for argument in arguments {
            line.push(' ');
            line.push_str(&argument);
        }
        line
    })
}

proptest! {
    #[test]
    fn reparsing_the_rendered_line_is_idempotent(line in line_strategy()) {
        let parsed = Command::parse(&line).expect("generated lines are valid");
        let rendered = parsed.to_string();
        let reparsed = Command::parse(&rendered).expect("rendered lines are valid");
        prop_assert_eq!(&reparsed, &parsed);
        prop_assert_eq!(reparsed.to_string(), rendered);
    }
}
