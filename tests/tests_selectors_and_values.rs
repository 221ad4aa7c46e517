use rstest::rstest;
use stcss::css::selector::{SelectorNode, parse_selector_list};
use stcss::css::value::{ValueNode, serialize_value, split_dotted, tokenize_value, unescape};

#[rstest]
#[case(".a")]
#[case(".a.b:hover")]
#[case(".a > .b + .c ~ .d")]
#[case("Button[disabled] .x")]
#[case(":not(.a, .b) .c")]
#[case("*")]
#[case("&.on")]
#[case("::before")]
#[case("#id .cls")]
fn selector_round_trips(#[case] input: &str) {
    let list = parse_selector_list(input);
    assert_eq!(list.to_string(), input);
}

#[rstest]
#[case("con (inline-size>100px)")]
#[case("name / inline-size")]
#[case("a, b as c")]
#[case("url(data:image/png;base64,xyz)")]
#[case("calc(100% - 10px)")]
fn value_round_trips(#[case] input: &str) {
    assert_eq!(serialize_value(&tokenize_value(input)), input);
}

#[rstest]
#[case("a.b", vec!["a", "b"])]
#[case(r"a\.b", vec![r"a\.b"])]
#[case("a.b.c", vec!["a", "b", "c"])]
fn dotted_names_split_on_unescaped_dots(#[case] input: &str, #[case] expected: Vec<&str>) {
    assert_eq!(split_dotted(input), expected);
}

#[test]
fn selector_list_normalizes_whitespace() {
    let list = parse_selector_list(" .a ,  .b   >  .c ");
    assert_eq!(list.to_string(), ".a, .b > .c");
}

#[test]
fn escaped_characters_stay_in_identifiers() {
    let nodes = tokenize_value(r"my\,name rest");
    assert_eq!(
        nodes[0],
        ValueNode::Ident(r"my\,name".into())
    );
    assert_eq!(unescape(r"my\,name"), "my,name");
}

#[test]
fn pseudo_class_arguments_keep_raw_text() {
    let list = parse_selector_list(":nth-child(2n + 1)");
    assert_eq!(
        list.selectors[0].nodes[0],
        SelectorNode::PseudoClass {
            name: "nth-child".into(),
            arg: Some("2n + 1".into())
        }
    );
}
